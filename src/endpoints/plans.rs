use super::EndpointError;
use crate::{
    client::{Body, HttpClient},
    NewPlan, Plan, PlanId, PlanUpdate,
};
use reqwest::Method;

/// Get every plan belonging to the current user, newest first.
pub async fn list_plans(client: &HttpClient) -> Result<Vec<Plan>, EndpointError> {
    let plans: Vec<Plan> = client.send_json(Method::GET, "plans/", Body::Empty).await?;
    log::debug!("Fetched {} plans", plans.len());

    Ok(plans)
}

pub async fn get_plan(client: &HttpClient, id: PlanId) -> Result<Plan, EndpointError> {
    client
        .send_json(Method::GET, &detail(id), Body::Empty)
        .await
}

/// Ask the server to create a new plan.
///
/// The server only echoes back the new plan's ID, so the rest of the
/// returned [`Plan`] is filled in from `new`.
pub async fn create_plan(
    client: &HttpClient,
    new: &NewPlan,
) -> Result<Plan, EndpointError> {
    new.validate().map_err(EndpointError::InvalidRequest)?;
    log::trace!("Payload: {:#?}", new);

    let mut plan: Plan = client
        .send_json(Method::POST, "plans/", Body::json(new)?)
        .await?;
    plan.fill_from(new);

    log::info!("Created plan {}", plan.id);

    Ok(plan)
}

/// Apply a partial update to a plan, returning the plan as the server now
/// sees it.
pub async fn update_plan(
    client: &HttpClient,
    id: PlanId,
    update: &PlanUpdate,
) -> Result<Plan, EndpointError> {
    if update.is_empty() {
        return Err(EndpointError::InvalidRequest(String::from(
            "Nothing to update",
        )));
    }

    client
        .send_json(Method::PUT, &detail(id), Body::json(update)?)
        .await
}

pub async fn delete_plan(client: &HttpClient, id: PlanId) -> Result<(), EndpointError> {
    client.send(Method::DELETE, &detail(id), Body::Empty).await?;
    log::info!("Deleted plan {}", id);

    Ok(())
}

fn detail(id: PlanId) -> String { format!("plans/{}/", id) }
