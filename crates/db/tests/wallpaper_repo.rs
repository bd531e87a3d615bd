//! Repository tests against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a scratch server and
//! `cargo test -p wallery-db -- --ignored`.

use sqlx::PgPool;
use wallery_db::models::wallpaper::{CreateWallpaper, WallpaperListParams};
use wallery_db::repositories::WallpaperRepo;

fn new_wallpaper(name: &str, tags: &[&str]) -> CreateWallpaper {
    CreateWallpaper {
        name: name.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        image_url: format!("https://i.example.com/{name}.png"),
        thumb_url: format!("https://i.example.com/{name}_thumb.png"),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn create_assigns_id_and_timestamp(pool: PgPool) {
    let created = WallpaperRepo::create(&pool, &new_wallpaper("sunset", &["nature", "sunset"]))
        .await
        .unwrap();

    assert!(created.id > 0);
    assert_eq!(created.name, "sunset");
    assert_eq!(created.tags, vec!["nature", "sunset"]);

    let found = WallpaperRepo::find_by_id(&pool, created.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, created);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn list_is_newest_first(pool: PgPool) {
    let first = WallpaperRepo::create(&pool, &new_wallpaper("first", &[]))
        .await
        .unwrap();
    let second = WallpaperRepo::create(&pool, &new_wallpaper("second", &[]))
        .await
        .unwrap();

    let listed = WallpaperRepo::list(&pool, &WallpaperListParams::default())
        .await
        .unwrap();
    let ids: Vec<_> = listed.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn list_filters_by_tag_and_paginates(pool: PgPool) {
    for (name, tags) in [
        ("a", &["city"][..]),
        ("b", &["forest"][..]),
        ("c", &["city", "night"][..]),
    ] {
        WallpaperRepo::create(&pool, &new_wallpaper(name, tags))
            .await
            .unwrap();
    }

    let city = WallpaperRepo::list(
        &pool,
        &WallpaperListParams {
            tag: Some("city".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let names: Vec<_> = city.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a"]);

    let page = WallpaperRepo::list(
        &pool,
        &WallpaperListParams {
            limit: Some(1),
            offset: Some(1),
            tag: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].name, "b");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn blank_name_violates_check_constraint(pool: PgPool) {
    let result = WallpaperRepo::create(&pool, &new_wallpaper("   ", &[])).await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn health_check_succeeds(pool: PgPool) {
    wallery_db::health_check(&pool).await.unwrap();
}
