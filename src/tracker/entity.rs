//! The tracker's cached view of one order and its delivery.
//!
//! Every write carries the request token taken when the server read was issued. The
//! snapshot keeps the highest token it has applied (one high-water mark for server
//! state, one for location samples) and discards anything older, so the displayed
//! status never regresses to a value that arrived late.

use crate::api::ClientError;
use crate::framework::{ActorEntity, ApplyOutcome};
use crate::model::{Delivery, DeliveryId, DeliveryStatus, LocationSample, Order, Route};
use crate::tracker::TrackerError;
use async_trait::async_trait;
use tracing::debug;

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerSnapshot {
    pub order: Option<Order>,
    pub delivery: Option<Delivery>,
    /// Present only while the delivery is in transit.
    pub driver_location: Option<LocationSample>,
    pub route: Option<Route>,
    /// Failure of the most recent background refresh. Cleared by the next applied fetch.
    pub last_error: Option<ClientError>,
    status_token: u64,
    location_token: u64,
    /// Set once a sample from the device's own stream has been applied.
    streaming: bool,
}

impl TrackerSnapshot {
    pub fn delivery_status(&self) -> Option<DeliveryStatus> {
        self.delivery.as_ref().map(|d| d.status)
    }

    /// Intents the driver may raise from the cached status.
    pub fn next_actions(&self) -> &'static [DeliveryStatus] {
        match self.delivery_status() {
            Some(status) => status.next_actions(),
            None => &[],
        }
    }

    fn accept_status(&mut self, token: u64) -> bool {
        if token <= self.status_token {
            return false;
        }
        self.status_token = token;
        true
    }

    /// Replaces the delivery, taking its reported driver position unless the device
    /// is streaming its own samples.
    fn adopt_delivery(&mut self, delivery: Option<Delivery>) {
        if !self.streaming {
            self.driver_location = delivery.as_ref().and_then(Delivery::driver_location);
        } else if delivery
            .as_ref()
            .map_or(true, |d| d.status != DeliveryStatus::InTransit)
        {
            self.driver_location = None;
        }
        self.delivery = delivery;
    }
}

#[derive(Debug, Clone)]
pub enum TrackerAction {
    /// Result of fetching an order and (when it has one) its delivery.
    ApplyFetch {
        token: u64,
        order: Order,
        delivery: Option<Delivery>,
    },
    /// Result of fetching a delivery directly (driver side).
    ApplyDelivery { token: u64, delivery: Delivery },
    /// A transition the backend confirmed.
    ApplyStatus {
        token: u64,
        delivery_id: DeliveryId,
        status: DeliveryStatus,
    },
    ApplyLocation { token: u64, sample: LocationSample },
    SetRoute(Route),
    /// A failed background refresh. Ignored if a newer read has already been applied.
    RecordError { token: u64, error: ClientError },
    /// Clears the snapshot. Responses to requests issued before `token` stay discarded.
    Reset { token: u64 },
}

#[async_trait]
impl ActorEntity for TrackerSnapshot {
    type Action = TrackerAction;
    type ActionResult = ApplyOutcome;
    type Context = ();
    type Error = TrackerError;

    async fn handle_action(
        &mut self,
        action: TrackerAction,
        _ctx: &(),
    ) -> Result<ApplyOutcome, TrackerError> {
        let outcome = match action {
            TrackerAction::ApplyFetch {
                token,
                order,
                delivery,
            } => {
                if !self.accept_status(token) {
                    debug!(token, last = self.status_token, "Discarding stale order fetch");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.order = Some(order);
                self.adopt_delivery(delivery);
                self.last_error = None;
                ApplyOutcome::Applied
            }
            TrackerAction::ApplyDelivery { token, delivery } => {
                if !self.accept_status(token) {
                    debug!(token, last = self.status_token, "Discarding stale delivery fetch");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.adopt_delivery(Some(delivery));
                self.last_error = None;
                ApplyOutcome::Applied
            }
            TrackerAction::ApplyStatus {
                token,
                delivery_id,
                status,
            } => {
                let Some(current) = self.delivery.as_ref().filter(|d| d.id == delivery_id) else {
                    return Ok(ApplyOutcome::Discarded);
                };
                // A confirmed forward move wins even over a poll that was issued later
                // but read the server before the transition landed.
                let forward = current.status.can_transition_to(status);
                if !forward && token <= self.status_token {
                    debug!(token, %status, "Discarding stale status");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.status_token = self.status_token.max(token);
                if let Some(delivery) = self.delivery.as_mut() {
                    delivery.status = status;
                }
                if status != DeliveryStatus::InTransit {
                    self.driver_location = None;
                }
                ApplyOutcome::Applied
            }
            TrackerAction::ApplyLocation { token, sample } => {
                if token <= self.location_token {
                    debug!(token, last = self.location_token, "Discarding stale location");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.location_token = token;
                self.streaming = true;
                if self.delivery_status() != Some(DeliveryStatus::InTransit) {
                    let status = self.delivery_status();
                    debug!(token, ?status, "Location hidden outside transit");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.driver_location = Some(sample);
                ApplyOutcome::Applied
            }
            TrackerAction::SetRoute(route) => {
                self.route = Some(route);
                ApplyOutcome::Applied
            }
            TrackerAction::RecordError { token, error } => {
                if token <= self.status_token {
                    debug!(token, last = self.status_token, "Discarding stale poll error");
                    return Ok(ApplyOutcome::Discarded);
                }
                self.last_error = Some(error);
                ApplyOutcome::Applied
            }
            TrackerAction::Reset { token } => {
                *self = TrackerSnapshot {
                    status_token: token.max(self.status_token),
                    location_token: token.max(self.location_token),
                    ..TrackerSnapshot::default()
                };
                ApplyOutcome::Applied
            }
        };
        Ok(outcome)
    }
}
