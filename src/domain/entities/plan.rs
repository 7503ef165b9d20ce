use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entry a subscription can point at. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    id: Uuid,
    code: String,
    name: String,
    /// Ordering key for upgrade/downgrade decisions (higher is better)
    rank: i32,
    price_cents: i64,
    /// Plan/price identifier understood by the billing provider
    remote_plan_id: String,
}

impl Plan {
    pub fn new(
        id: Uuid,
        code: impl Into<String>,
        name: impl Into<String>,
        rank: i32,
        price_cents: i64,
        remote_plan_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
            rank,
            price_cents,
            remote_plan_id: remote_plan_id.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn price_cents(&self) -> i64 {
        self.price_cents
    }

    pub fn remote_plan_id(&self) -> &str {
        &self.remote_plan_id
    }

    pub fn is_upgrade_from(&self, from: Option<&Plan>) -> bool {
        PlanChange::between(from, self) == PlanChange::Upgrade
    }

    pub fn is_downgrade_from(&self, from: Option<&Plan>) -> bool {
        PlanChange::between(from, self) == PlanChange::Downgrade
    }
}

/// Direction of a switch between two plans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanChange {
    Upgrade,
    Downgrade,
    /// Same rank: neither an upgrade nor a downgrade
    Lateral,
}

impl PlanChange {
    /// Starting from no plan always counts as an upgrade.
    pub fn between(from: Option<&Plan>, to: &Plan) -> Self {
        match from {
            None => PlanChange::Upgrade,
            Some(from) if from.rank < to.rank => PlanChange::Upgrade,
            Some(from) if from.rank > to.rank => PlanChange::Downgrade,
            Some(_) => PlanChange::Lateral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanChange::Upgrade => "upgrade",
            PlanChange::Downgrade => "downgrade",
            PlanChange::Lateral => "lateral",
        }
    }
}
