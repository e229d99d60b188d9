use crate::infra::{Collaborators, SeedSources};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::Args;
use deal_genie::config::AppConfig;
use deal_genie::digest::{DigestRunSummary, DigestSendStatus, GenieDigestJob, Subscriber};
use deal_genie::error::AppError;
use deal_genie::personalization::{
    ActivityRecord, ActivityType, CandidateProperty, FeedbackRecord, FeedbackSentiment,
    PropertyAttributeSnapshot, PropertyId, RecommendationService, RecommendationSet,
    SearchPreferences, SessionResolver, UserId,
};
use std::path::PathBuf;
use std::sync::Arc;

pub(crate) const DEMO_TOKEN: &str = "demo-token";

#[derive(Args, Debug, Default)]
pub(crate) struct RecommendArgs {
    /// Session token of the user to personalize for
    #[arg(long, default_value = DEMO_TOKEN)]
    pub(crate) token: String,
    /// Number of picks to return (clamped to the configured maximum)
    #[arg(long)]
    pub(crate) limit: Option<usize>,
    /// Catalog CSV export to score instead of the demo catalog
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Activity CSV export to profile instead of the demo history
    #[arg(long)]
    pub(crate) activity_csv: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DigestArgs {
    /// Week the digest is generated for (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Catalog CSV export to score instead of the demo catalog
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Activity CSV export to profile instead of the demo history
    #[arg(long)]
    pub(crate) activity_csv: Option<PathBuf>,
}

pub(crate) async fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let collaborators = Collaborators::seed(&SeedSources {
        catalog_csv: args.catalog_csv,
        activity_csv: args.activity_csv,
    })?;

    let context = collaborators.sessions.resolve(&args.token)?;
    let service = RecommendationService::new(
        collaborators.store,
        collaborators.catalog,
        config.personalization,
    );
    let set = service.recommend(&context, args.limit).await?;

    render_recommendations(&context.user_id, &set);
    Ok(())
}

pub(crate) async fn run_digest(args: DigestArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let collaborators = Collaborators::seed(&SeedSources {
        catalog_csv: args.catalog_csv,
        activity_csv: args.activity_csv,
    })?;

    let service = Arc::new(RecommendationService::new(
        collaborators.store,
        collaborators.catalog,
        config.personalization,
    ));
    let mailer = collaborators.mailer;
    let job = GenieDigestJob::new(
        service,
        collaborators.subscribers,
        mailer.clone(),
        config.digest,
    );

    let now = digest_time(args.as_of);
    let summary = job.run(now).await?;

    render_digest_summary(&summary);
    for email in mailer.outbox() {
        println!("\n--- {} ---\nSubject: {}\n{}", email.to, email.subject, email.text_body);
    }
    Ok(())
}

fn digest_time(as_of: Option<NaiveDate>) -> DateTime<Utc> {
    as_of
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

fn render_recommendations(user_id: &UserId, set: &RecommendationSet) {
    println!("Genie picks for {user_id}");
    println!("{}", set.explanation.reasoning_text);

    let top = &set.explanation.user_preferences.top_categories;
    if !top.is_empty() {
        let keys: Vec<&str> = top.iter().map(|category| category.key()).collect();
        println!("Top interests: {}", keys.join(", "));
    }

    if set.recommendations.is_empty() {
        println!("\nNo new properties match right now.");
        return;
    }

    println!();
    for (idx, pick) in set.recommendations.iter().enumerate() {
        println!(
            "{:>2}. {:<28} {:>5.1}  {}",
            idx + 1,
            pick.property.address,
            pick.match_score,
            pick.match_reason
        );
    }
}

fn render_digest_summary(summary: &DigestRunSummary) {
    println!(
        "Genie picks digest: {} processed, {} sent, {} skipped, {} failed",
        summary.processed, summary.sent, summary.skipped, summary.failed
    );
    for record in &summary.records {
        let status = match record.status {
            DigestSendStatus::Sent => "sent",
            DigestSendStatus::Skipped => "skipped",
            DigestSendStatus::Failed => "failed",
        };
        match &record.error {
            Some(error) => println!("  {:<24} {status:<8} {error}", record.email),
            None => println!("  {:<24} {status:<8} {} picks", record.email, record.picks),
        }
    }
}

pub(crate) fn demo_user() -> UserId {
    UserId("investor-ava".to_string())
}

pub(crate) fn token_for(user_id: &UserId) -> String {
    if *user_id == demo_user() {
        DEMO_TOKEN.to_string()
    } else {
        format!("{user_id}-token")
    }
}

pub(crate) fn subscribers() -> Vec<Subscriber> {
    vec![
        Subscriber {
            user_id: demo_user(),
            email: "ava@example.com".to_string(),
            first_name: Some("Ava".to_string()),
        },
        Subscriber {
            user_id: UserId("investor-ben".to_string()),
            email: "ben@example.com".to_string(),
            first_name: None,
        },
    ]
}

struct Listing {
    id: &'static str,
    address: &'static str,
    deal_score: f64,
    zipcode: &'static str,
    property_type: &'static str,
    bedrooms: u8,
    bathrooms: f32,
    price: u64,
}

impl Listing {
    fn snapshot(&self) -> PropertyAttributeSnapshot {
        PropertyAttributeSnapshot {
            zipcode: Some(self.zipcode.to_string()),
            property_type: Some(self.property_type.to_string()),
            bedrooms: Some(self.bedrooms),
            bathrooms: Some(self.bathrooms),
            price: Some(self.price),
            ..Default::default()
        }
    }
}

static LISTINGS: [Listing; 12] = [
    Listing { id: "p-101", address: "1420 Woodland Ave", deal_score: 74.0, zipcode: "50309", property_type: "Single Family", bedrooms: 3, bathrooms: 2.0, price: 215_000 },
    Listing { id: "p-102", address: "907 Pleasant St", deal_score: 69.0, zipcode: "50309", property_type: "Single Family", bedrooms: 4, bathrooms: 2.5, price: 239_000 },
    Listing { id: "p-103", address: "3311 Cottage Grove", deal_score: 71.0, zipcode: "50310", property_type: "Single Family", bedrooms: 3, bathrooms: 1.5, price: 198_000 },
    Listing { id: "p-104", address: "2700 Beaver Ave", deal_score: 66.0, zipcode: "50310", property_type: "Multi-Family", bedrooms: 4, bathrooms: 2.0, price: 289_000 },
    Listing { id: "p-201", address: "1811 High St", deal_score: 72.0, zipcode: "50309", property_type: "Single Family", bedrooms: 3, bathrooms: 2.0, price: 229_000 },
    Listing { id: "p-202", address: "640 19th St", deal_score: 81.0, zipcode: "50309", property_type: "Single Family", bedrooms: 4, bathrooms: 2.5, price: 312_000 },
    Listing { id: "p-203", address: "4120 Urbandale Ave", deal_score: 68.0, zipcode: "50310", property_type: "Multi-Family", bedrooms: 4, bathrooms: 2.0, price: 279_000 },
    Listing { id: "p-204", address: "3905 Lincoln Pl", deal_score: 64.0, zipcode: "50310", property_type: "Single Family", bedrooms: 3, bathrooms: 1.5, price: 189_000 },
    Listing { id: "p-205", address: "1525 Crocker St", deal_score: 77.0, zipcode: "50309", property_type: "Single Family", bedrooms: 3, bathrooms: 2.0, price: 245_000 },
    Listing { id: "p-206", address: "5102 SW 9th St", deal_score: 90.0, zipcode: "50315", property_type: "Single Family", bedrooms: 3, bathrooms: 2.0, price: 210_000 },
    Listing { id: "p-207", address: "1210 Grand Ave", deal_score: 85.0, zipcode: "50309", property_type: "Condo", bedrooms: 2, bathrooms: 1.0, price: 159_000 },
    Listing { id: "p-208", address: "4400 Hickman Rd", deal_score: 88.0, zipcode: "50310", property_type: "Single Family", bedrooms: 5, bathrooms: 3.0, price: 415_000 },
];

fn listing(id: &str) -> Option<&'static Listing> {
    LISTINGS.iter().find(|listing| listing.id == id)
}

fn details(id: &str) -> PropertyAttributeSnapshot {
    let mut snapshot = listing(id).map(Listing::snapshot).unwrap_or_default();
    match id {
        "p-101" => snapshot.price_drop_percent = Some(12.0),
        "p-102" => snapshot.price_drop_percent = Some(9.0),
        "p-103" => snapshot.potential_roi = Some(14.0),
        "p-104" => snapshot.potential_roi = Some(16.0),
        "p-201" => snapshot.price_drop_percent = Some(7.0),
        "p-202" => snapshot.days_on_market = Some(3),
        "p-203" => snapshot.potential_roi = Some(15.0),
        "p-204" => {
            snapshot.price_drop_percent = Some(11.0);
            snapshot.distressed = Some(true);
        }
        "p-205" => {
            snapshot.equity = Some(120_000.0);
            snapshot.owner_occupied = Some(false);
        }
        "p-206" => snapshot.price_drop_percent = Some(15.0),
        _ => {}
    }
    snapshot
}

pub(crate) fn catalog() -> Vec<CandidateProperty> {
    LISTINGS
        .iter()
        .map(|listing| CandidateProperty {
            property_id: PropertyId(listing.id.to_string()),
            address: listing.address.to_string(),
            base_score: listing.deal_score,
            attributes: details(listing.id),
        })
        .collect()
}

fn seen_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, 18, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub(crate) fn activity() -> Vec<(UserId, ActivityRecord)> {
    [
        ("p-101", ActivityType::View, 1),
        ("p-102", ActivityType::View, 2),
        ("p-103", ActivityType::View, 3),
        ("p-104", ActivityType::Save, 4),
    ]
    .into_iter()
    .map(|(id, activity_type, day)| {
        (
            demo_user(),
            ActivityRecord {
                property_id: PropertyId(id.to_string()),
                activity_type,
                details: details(id),
                timestamp: seen_at(day),
            },
        )
    })
    .collect()
}

pub(crate) fn feedback() -> Vec<(UserId, FeedbackRecord)> {
    vec![(
        demo_user(),
        FeedbackRecord {
            property_id: PropertyId("p-102".to_string()),
            sentiment: FeedbackSentiment::ThumbsUp,
            details: details("p-102"),
            timestamp: seen_at(5),
        },
    )]
}

pub(crate) fn saved_searches() -> Vec<(UserId, SearchPreferences)> {
    vec![(
        demo_user(),
        SearchPreferences {
            max_price: Some(325_000),
            min_bedrooms: Some(3),
            ..Default::default()
        },
    )]
}
