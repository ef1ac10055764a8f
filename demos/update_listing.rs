use listing_rewards::{
    Listing, ListingService, ListingStore, ListingType, ListingUpdate, MemoryStore, Requester,
    ServiceConfig, Submission, WinnerPosition,
};

#[tokio::main]
async fn main() -> listing_rewards::Result<()> {
    let store = MemoryStore::new();
    let rewards = ListingUpdate::from_json(
        r#"{"rewards": {"first": 1000, "second": 600, "third": 300, "fourth": 200, "fifth": 100}}"#,
    )?
    .rewards
    .unwrap_or_default();

    let listing = Listing::new("bounty-1", "sponsor-1", ListingType::Bounty, "Write a thread")
        .with_rewards(rewards);
    store.insert_listing(listing).await;

    let positions = [
        WinnerPosition::First,
        WinnerPosition::Second,
        WinnerPosition::Third,
        WinnerPosition::Fourth,
        WinnerPosition::Fifth,
    ];
    for (i, position) in positions.into_iter().enumerate() {
        let id = format!("sub-{}", i + 1);
        store
            .insert_submission(Submission::new(id.as_str(), "bounty-1", "talent").winner(position))
            .await;
    }

    let service = ListingService::with_config(store, ServiceConfig::from_env()?);
    let update = ListingUpdate::from_json(r#"{"rewards": {"first": 1500, "second": 700}}"#)?;
    let listing = service
        .update_listing(
            &Requester::sponsor("user-1", "sponsor-1"),
            &"bounty-1".into(),
            update,
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&listing)?);
    for submission in service.store().submissions(&listing.id).await? {
        println!(
            "{} winner={} position={:?}",
            submission.id, submission.is_winner, submission.winner_position
        );
    }
    Ok(())
}
