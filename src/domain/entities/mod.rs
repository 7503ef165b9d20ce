pub mod coupon;
pub mod payment_provider;
pub mod payment_scenario;
pub mod plan;
pub mod subscription;
pub mod sync_policy;
