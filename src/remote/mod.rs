//! Remote service clients: prediction, routing group save/load, and the
//! fire-and-forget UI audit endpoint.

pub mod audit_api;
pub mod error;
pub mod mock;
pub mod prediction;
pub mod routing_group;

pub use audit_api::UiAuditClient;
pub use error::{ErrorDetails, RemoteError};
pub use mock::{MockPredictionClient, MockRoutingGroupClient};
pub use prediction::{
    HttpPredictionClient, PredictRequest, PredictResponse, PredictedItem, PredictedOperation,
    PredictionApi,
};
pub use routing_group::{
    ConnectionPayload, GroupDetail, GroupList, GroupListQuery, GroupSummary,
    HttpRoutingGroupClient, Pagination, RoutingGroupApi, RoutingGroupPayload, RoutingStepPayload,
};
