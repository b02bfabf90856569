pub mod profile;
pub mod prompt;

use std::error::Error;
use std::fmt;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::llm::{LlmManager, TextCompleter};
use crate::planner::profile::{BookingRecord, UserProfile};
use crate::planner::prompt::build_prompt;
use crate::warehouse::data_api::DataApiClient;
use crate::warehouse::executor::StatementExecutor;
use crate::warehouse::{QueryRequest, WarehouseClient};

#[derive(Debug, PartialEq)]
pub enum PlanError {
    /// The query finished but returned no rows for the user.
    EmptyResultSet,
    /// A column the planner relies on is absent from the result metadata.
    MissingColumn(String),
    /// A cell held a different type than the planner expects.
    CellType {
        column: String,
        expected: &'static str,
    },
    InvalidDate {
        column: String,
        value: String,
    },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::EmptyResultSet => {
                write!(f, "no profile or booking rows found for this user")
            }
            PlanError::MissingColumn(column) => {
                write!(f, "result set is missing expected column '{}'", column)
            }
            PlanError::CellType { column, expected } => {
                write!(f, "column '{}' did not hold a {} value", column, expected)
            }
            PlanError::InvalidDate { column, value } => {
                write!(f, "column '{}' held an unparseable date '{}'", column, value)
            }
        }
    }
}

impl Error for PlanError {}

/// Join of the user's profile with every booking they own, ascending by
/// check-in date. The user id is bound as a named parameter server-side.
pub fn profile_query(schema: &str) -> String {
    format!(
        "select u.u_full_name as full_name, u.u_first_name as first_name, \
         u.u_age as age, u.u_city as home_city, u.u_country as home_country, \
         u.u_interest as hobbies_interest, u.u_fav_food as favorite_food, \
         b.b_city as travel_city, b.b_country as travel_country, \
         b.b_checkin as from_date, b.b_checkout as to_date \
         from {schema}.user_profile u \
         join {schema}.booking_data b on b.b_user_id = u.u_user_id \
         where u.u_user_id = :user_id \
         order by b.b_checkin"
    )
}

/// Runs the query, extracts the profile and bookings, and asks the model
/// for an itinerary. Any non-FINISHED statement short-circuits before the
/// model is ever invoked.
async fn plan_user<C, L>(
    executor: &StatementExecutor<C>,
    llm: &L,
    request: QueryRequest,
) -> Result<String, Box<dyn Error + Send + Sync>>
where
    C: WarehouseClient,
    L: TextCompleter,
{
    let outcome = executor.run(&request).await?;

    let user = UserProfile::from_result(&outcome.result)?;
    let bookings = BookingRecord::from_result(&outcome.result)?;
    info!(
        "building itinerary prompt for {} covering {} bookings",
        user.first_name,
        bookings.len()
    );

    let prompt = build_prompt(&user, &bookings);
    let itinerary = llm.complete(&prompt).await?;
    Ok(itinerary)
}

/// Full plan flow: fetch the user's profile and bookings, assemble the
/// prompt, and ask the model for an itinerary.
pub async fn generate_itinerary(
    config: &AppConfig,
    user_id: &str,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let allowed = config.warehouse.table_list();
    if !allowed.is_empty() {
        for table in ["user_profile", "booking_data"] {
            if !allowed.iter().any(|t| t == table) {
                warn!("table {} is not in the tables_to_be_fed_to_llm list", table);
            }
        }
    }

    // The model client is constructed before any warehouse round trip so a
    // bad LLM configuration fails fast instead of after a long poll.
    let llm = LlmManager::new(&config.llm)?;

    let client = DataApiClient::new(&config.warehouse)?;
    let executor = StatementExecutor::new(client, config.warehouse.poll_interval());
    let request = QueryRequest::new(
        profile_query(&config.warehouse.schema_name),
        &config.warehouse,
    )
    .with_parameter("user_id", user_id);

    plan_user(&executor, &llm, request).await
}
