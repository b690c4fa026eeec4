use chrono::Duration;
use renshu_core::model::{AchievementId, SessionSummary, UnitKey};
use renshu_core::time::fixed_now;
use storage::repository::{ProgressRecord, ProgressRepository, SessionSummaryRepository};
use storage::sqlite::SqliteRepository;

fn record(unit: &str, points: u32) -> ProgressRecord {
    ProgressRecord {
        unit_key: UnitKey::new(unit),
        achievement_id: Some(AchievementId::new(format!("{unit}_logro"))),
        points,
        completed_at: fixed_now(),
        meta: Some(r#"{"score":200,"total":2}"#.to_owned()),
    }
}

#[tokio::test]
async fn sqlite_award_is_idempotent_and_sums_xp() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_awards?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert!(repo.try_award(&record("unit_masen_neg", 10)).await.unwrap());
    assert!(!repo.try_award(&record("unit_masen_neg", 10)).await.unwrap());
    assert_eq!(repo.total_xp().await.unwrap(), 10);

    assert!(repo.try_award(&record("n3_b3_u1", 30)).await.unwrap());
    assert_eq!(repo.total_xp().await.unwrap(), 40);

    let fetched = repo
        .get_progress(&UnitKey::new("unit_masen_neg"))
        .await
        .unwrap();
    assert_eq!(fetched.points, 10);
    assert_eq!(
        fetched.achievement_id,
        Some(AchievementId::new("unit_masen_neg_logro"))
    );
    assert_eq!(fetched.meta.as_deref(), Some(r#"{"score":200,"total":2}"#));

    let listed = repo.list_progress().await.unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn sqlite_summaries_round_trip_newest_first() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_summaries?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let unit = UnitKey::new("N5_B3_Cortesia");
    let earlier = SessionSummary::from_persisted(
        unit.clone(),
        fixed_now(),
        fixed_now() + Duration::minutes(2),
        3,
        2,
        1,
        200,
        2,
    )
    .unwrap();
    let later = SessionSummary::from_persisted(
        unit.clone(),
        fixed_now() + Duration::hours(1),
        fixed_now() + Duration::hours(1) + Duration::minutes(3),
        3,
        3,
        0,
        300,
        3,
    )
    .unwrap();

    repo.append_summary(&earlier).await.unwrap();
    repo.append_summary(&later).await.unwrap();

    let listed = repo.list_summaries(&unit, 10).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], later);
    assert_eq!(listed[1], earlier);

    let capped = repo.list_summaries(&unit, 1).await.unwrap();
    assert_eq!(capped.len(), 1);
    assert_eq!(capped[0], later);

    let other = repo
        .list_summaries(&UnitKey::new("otra_unidad"), 10)
        .await
        .unwrap();
    assert!(other.is_empty());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.migrate().await.expect("second migrate");

    assert!(repo.try_award(&record("n5_bienvenida", 5)).await.unwrap());
}
