use super::{ensure_authenticated, RequestSequence, StoreCell, StoreState};
use crate::{
    client::HttpClient,
    endpoints::{self, EndpointError},
    session::SessionAccess,
    NewPlan, Plan, PlanId, PlanUpdate,
};
use std::sync::Arc;

/// What the plans pages get to see.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlansState {
    /// Newest first.
    pub plans: Vec<Plan>,
    pub current_plan: Option<Plan>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl StoreState for PlansState {
    fn set_loading(&mut self, loading: bool) { self.is_loading = loading; }

    fn set_error(&mut self, error: Option<String>) { self.error = error; }
}

/// The user's plans, and whichever one they're looking at.
pub struct PlansStore {
    client: Arc<HttpClient>,
    session: Arc<dyn SessionAccess>,
    cell: StoreCell<PlansState>,
    list_requests: RequestSequence,
    detail_requests: RequestSequence,
}

impl PlansStore {
    pub fn new(client: Arc<HttpClient>, session: Arc<dyn SessionAccess>) -> Self {
        PlansStore {
            client,
            session,
            cell: StoreCell::default(),
            list_requests: RequestSequence::new(),
            detail_requests: RequestSequence::new(),
        }
    }

    pub fn state(&self) -> PlansState { self.cell.snapshot() }

    /// Fail fast if nobody is logged in.
    pub fn check_auth(&self) -> Result<(), EndpointError> {
        ensure_authenticated(&*self.session, &self.client)
    }

    /// Replace the list of plans with whatever the server has.
    pub async fn fetch_plans(&self) -> Result<Vec<Plan>, EndpointError> {
        const ACTION: &str = "fetch plans";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        let ticket = self.list_requests.issue();
        self.cell.begin();
        let result = endpoints::list_plans(&self.client).await;
        let is_current = || self.list_requests.is_current(ticket);

        self.cell.finish(ACTION, result, is_current, |state, plans| {
            state.plans = plans.clone();
        })
    }

    /// Fetch a single plan and make it the current one.
    pub async fn get_plan(&self, id: PlanId) -> Result<Plan, EndpointError> {
        const ACTION: &str = "fetch the plan";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        let ticket = self.detail_requests.issue();
        self.cell.begin();
        let result = endpoints::get_plan(&self.client, id).await;
        let is_current = || self.detail_requests.is_current(ticket);

        self.cell.finish(ACTION, result, is_current, |state, plan| {
            state.current_plan = Some(plan.clone());
        })
    }

    /// Create a plan, putting it at the front of the list.
    ///
    /// Like every mutation, a successful create makes any list fetch which
    /// is still in flight stale, since its response can't include the
    /// change.
    pub async fn create_plan(&self, new: &NewPlan) -> Result<Plan, EndpointError> {
        const ACTION: &str = "create the plan";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        self.cell.begin();
        let result = endpoints::create_plan(&self.client, new).await;

        self.cell.finish(ACTION, result, || true, |state, plan| {
            self.list_requests.issue();
            state.plans.insert(0, plan.clone());
        })
    }

    pub async fn update_plan(
        &self,
        id: PlanId,
        update: &PlanUpdate,
    ) -> Result<Plan, EndpointError> {
        const ACTION: &str = "update the plan";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        self.cell.begin();
        let result = endpoints::update_plan(&self.client, id, update).await;

        self.cell.finish(ACTION, result, || true, |state, plan| {
            self.invalidate_fetches();
            for existing in state.plans.iter_mut().filter(|p| p.id == id) {
                *existing = plan.clone();
            }
            if let Some(current) = state.current_plan.as_mut().filter(|p| p.id == id) {
                *current = plan.clone();
            }
        })
    }

    /// Delete a plan, removing it from the list (and deselecting it if it
    /// was the current plan).
    pub async fn delete_plan(&self, id: PlanId) -> Result<(), EndpointError> {
        const ACTION: &str = "delete the plan";
        self.check_auth().map_err(|e| self.cell.reject(ACTION, e))?;

        self.cell.begin();
        let result = endpoints::delete_plan(&self.client, id).await;

        self.cell.finish(ACTION, result, || true, |state, _| {
            self.invalidate_fetches();
            state.plans.retain(|p| p.id != id);
            if state.current_plan.as_ref().map(|p| p.id) == Some(id) {
                state.current_plan = None;
            }
        })
    }

    /// Make an already fetched plan the current one.
    pub fn select_plan(&self, id: PlanId) -> Option<Plan> {
        let mut selected = None;

        self.cell.update(|state| {
            selected = state.plans.iter().find(|p| p.id == id).cloned();
            state.current_plan = selected.clone();
        });

        selected
    }

    pub fn clear_error(&self) { self.cell.update(|state| state.error = None); }

    fn invalidate_fetches(&self) {
        self.list_requests.issue();
        self.detail_requests.issue();
    }
}

impl std::fmt::Debug for PlansStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlansStore")
            .field("state", &self.state())
            .finish()
    }
}
