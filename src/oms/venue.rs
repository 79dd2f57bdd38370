//! Order execution venue
//!
//! The engine only talks to a venue through [`Venue`]. Fills come back through
//! the engine's `on_fill` callback, driven by the host.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use super::types::{OrderHandle, OrderKind, OrderRequest};
use crate::error::VenueError;
use crate::{Money, Side};

/// Accepts order requests. Fills are reported asynchronously by the host.
pub trait Venue {
    fn submit(&mut self, request: &OrderRequest) -> Result<OrderHandle, VenueError>;

    fn cancel(&mut self, handle: OrderHandle) -> Result<(), VenueError>;

    fn modify(&mut self, handle: OrderHandle, new_price: Money, new_label: &str)
        -> Result<(), VenueError>;
}

impl<V: Venue + ?Sized> Venue for &mut V {
    fn submit(&mut self, request: &OrderRequest) -> Result<OrderHandle, VenueError> {
        (**self).submit(request)
    }

    fn cancel(&mut self, handle: OrderHandle) -> Result<(), VenueError> {
        (**self).cancel(handle)
    }

    fn modify(
        &mut self,
        handle: OrderHandle,
        new_price: Money,
        new_label: &str,
    ) -> Result<(), VenueError> {
        (**self).modify(handle, new_price, new_label)
    }
}

/// One request as seen by the venue, accepted or not
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VenueRequest {
    Submit {
        request: OrderRequest,
        handle: Option<OrderHandle>,
    },
    Cancel {
        handle: OrderHandle,
        accepted: bool,
    },
    Modify {
        handle: OrderHandle,
        price: Money,
        label: String,
        accepted: bool,
    },
}

impl VenueRequest {
    pub fn is_submit_of(&self, kind: OrderKind) -> bool {
        matches!(self, VenueRequest::Submit { request, .. } if request.kind == kind)
    }

    pub fn is_modify(&self) -> bool {
        matches!(self, VenueRequest::Modify { .. })
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, VenueRequest::Cancel { .. })
    }
}

/// Injected failure for the next matching request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Submit(OrderKind),
    Cancel,
    Modify,
}

/// Order resting at the paper venue
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingOrder {
    pub handle: OrderHandle,
    pub request: OrderRequest,
}

/// Immediate-acknowledgement venue for replays and tests
///
/// Accepts every request unless a rejection was injected, records what it was
/// asked to do, and keeps working orders until the host asks for fills. There
/// is no book matching: market orders fill at whatever price the host passes
/// to [`PaperVenue::fill_market_orders`], stops fill at their own price once a
/// close passed to [`PaperVenue::triggered_stops`] touches them. An order fills
/// at most once.
#[derive(Debug, Default)]
pub struct PaperVenue {
    next_handle: u64,
    working: BTreeMap<OrderHandle, WorkingOrder>,
    requests: Vec<VenueRequest>,
    rejections: VecDeque<(Rejection, String)>,
}

impl PaperVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next request matching `rejection` with `reason`
    pub fn reject_next(&mut self, rejection: Rejection, reason: impl Into<String>) {
        self.rejections.push_back((rejection, reason.into()));
    }

    /// Every request received since the last drain, in order
    pub fn requests(&self) -> &[VenueRequest] {
        &self.requests
    }

    /// Take the request log, leaving it empty
    pub fn drain_requests(&mut self) -> Vec<VenueRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn working_orders(&self) -> impl Iterator<Item = &WorkingOrder> {
        self.working.values()
    }

    pub fn working_order(&self, handle: OrderHandle) -> Option<&WorkingOrder> {
        self.working.get(&handle)
    }

    /// Remove all working market orders, filled at `price`
    pub fn fill_market_orders(&mut self, price: Money) -> Vec<(OrderHandle, Money)> {
        self.take_where(|order| order.request.kind == OrderKind::Market)
            .into_iter()
            .map(|order| (order.handle, price))
            .collect()
    }

    /// Remove all working stops touched by `close`, filled at their stop price
    pub fn triggered_stops(&mut self, close: Money) -> Vec<(OrderHandle, Money)> {
        self.take_where(|order| stop_touched(&order.request, close))
            .into_iter()
            .filter_map(|order| order.request.price.map(|price| (order.handle, price)))
            .collect()
    }

    fn take_where<F>(&mut self, mut predicate: F) -> Vec<WorkingOrder>
    where
        F: FnMut(&WorkingOrder) -> bool,
    {
        let handles: Vec<OrderHandle> = self
            .working
            .values()
            .filter(|order| predicate(order))
            .map(|order| order.handle)
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| self.working.remove(&handle))
            .collect()
    }

    fn take_rejection(&mut self, action: Rejection) -> Option<String> {
        let index = self.rejections.iter().position(|(r, _)| *r == action)?;
        self.rejections.remove(index).map(|(_, reason)| reason)
    }
}

fn stop_touched(request: &OrderRequest, close: Money) -> bool {
    match (request.kind, request.price) {
        (OrderKind::Stop, Some(price)) => match request.side {
            Side::Sell => close <= price,
            Side::Buy => close >= price,
        },
        _ => false,
    }
}

impl Venue for PaperVenue {
    fn submit(&mut self, request: &OrderRequest) -> Result<OrderHandle, VenueError> {
        if let Some(reason) = self.take_rejection(Rejection::Submit(request.kind)) {
            self.requests.push(VenueRequest::Submit {
                request: request.clone(),
                handle: None,
            });
            return Err(VenueError::Rejected(reason));
        }

        self.next_handle += 1;
        let handle = OrderHandle(self.next_handle);
        self.working.insert(
            handle,
            WorkingOrder {
                handle,
                request: request.clone(),
            },
        );
        self.requests.push(VenueRequest::Submit {
            request: request.clone(),
            handle: Some(handle),
        });
        Ok(handle)
    }

    fn cancel(&mut self, handle: OrderHandle) -> Result<(), VenueError> {
        let result = match self.take_rejection(Rejection::Cancel) {
            Some(reason) => Err(VenueError::Rejected(reason)),
            None => self
                .working
                .remove(&handle)
                .map(|_| ())
                .ok_or(VenueError::UnknownOrder(handle)),
        };
        self.requests.push(VenueRequest::Cancel {
            handle,
            accepted: result.is_ok(),
        });
        result
    }

    fn modify(
        &mut self,
        handle: OrderHandle,
        new_price: Money,
        new_label: &str,
    ) -> Result<(), VenueError> {
        let result = match self.take_rejection(Rejection::Modify) {
            Some(reason) => Err(VenueError::Rejected(reason)),
            None => match self.working.get_mut(&handle) {
                Some(order) => {
                    order.request.price = Some(new_price);
                    order.request.label = new_label.to_string();
                    Ok(())
                }
                None => Err(VenueError::UnknownOrder(handle)),
            },
        };
        self.requests.push(VenueRequest::Modify {
            handle,
            price: new_price,
            label: new_label.to_string(),
            accepted: result.is_ok(),
        });
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbol;
    use rust_decimal_macros::dec;

    fn stop_sell(price: Money) -> OrderRequest {
        OrderRequest::stop(Symbol::new("ES"), Side::Sell, 1, price, "StopLoss triggered")
    }

    #[test]
    fn test_market_orders_fill_once() {
        let mut venue = PaperVenue::new();
        let req = OrderRequest::market(Symbol::new("ES"), Side::Buy, 1, "entry");
        let handle = venue.submit(&req).unwrap();

        let fills = venue.fill_market_orders(Money::from(dec!(4000)));
        assert_eq!(fills, vec![(handle, Money::from(dec!(4000)))]);
        assert!(venue.fill_market_orders(Money::from(dec!(4001))).is_empty());
    }

    #[test]
    fn test_stop_triggers_on_touch() {
        let mut venue = PaperVenue::new();
        let handle = venue.submit(&stop_sell(Money::from(dec!(3850)))).unwrap();

        assert!(venue.triggered_stops(Money::from(dec!(3851))).is_empty());
        let fills = venue.triggered_stops(Money::from(dec!(3850)));
        assert_eq!(fills, vec![(handle, Money::from(dec!(3850)))]);
        assert!(venue.working_order(handle).is_none());
    }

    #[test]
    fn test_modify_and_cancel() {
        let mut venue = PaperVenue::new();
        let handle = venue.submit(&stop_sell(Money::from(dec!(3850)))).unwrap();

        venue
            .modify(handle, Money::from(dec!(4025)), "Breakeven triggered")
            .unwrap();
        let order = venue.working_order(handle).unwrap();
        assert_eq!(order.request.price, Some(Money::from(dec!(4025))));
        assert_eq!(order.request.label, "Breakeven triggered");

        venue.cancel(handle).unwrap();
        assert_eq!(venue.cancel(handle), Err(VenueError::UnknownOrder(handle)));
        assert_eq!(venue.requests().len(), 4);
    }

    #[test]
    fn test_drain_requests_keeps_working_orders() {
        let mut venue = PaperVenue::new();
        let handle = venue.submit(&stop_sell(Money::from(dec!(3850)))).unwrap();
        venue
            .modify(handle, Money::from(dec!(4025)), "Breakeven triggered")
            .unwrap();

        let drained = venue.drain_requests();
        assert_eq!(drained.len(), 2);
        assert!(drained[1].is_modify());
        assert!(venue.requests().is_empty());
        assert!(venue.working_order(handle).is_some());

        venue.cancel(handle).unwrap();
        assert_eq!(venue.requests().len(), 1);
        assert!(venue.requests()[0].is_cancel());
    }

    #[test]
    fn test_injected_rejection_is_recorded() {
        let mut venue = PaperVenue::new();
        venue.reject_next(Rejection::Submit(OrderKind::Stop), "price outside band");

        let market = OrderRequest::market(Symbol::new("ES"), Side::Buy, 1, "entry");
        assert!(venue.submit(&market).is_ok(), "rejection only matches stops");

        let err = venue.submit(&stop_sell(Money::from(dec!(3850)))).unwrap_err();
        assert_eq!(err, VenueError::Rejected("price outside band".to_string()));
        assert_eq!(
            venue.requests().last(),
            Some(&VenueRequest::Submit {
                request: stop_sell(Money::from(dec!(3850))),
                handle: None,
            })
        );
        assert!(venue.submit(&stop_sell(Money::from(dec!(3850)))).is_ok());
    }
}
