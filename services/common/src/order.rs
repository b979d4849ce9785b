//! Order ticket as seen by routing and buying-power checks

use crate::{Instrument, Px, Qty, Side};
use serde::{Deserialize, Serialize};

/// An order with the attributes routing and risk care about
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    /// Engine-internal order ID
    pub order_id: u64,
    /// Instrument being traded
    pub instrument: Instrument,
    /// Buy or sell
    pub side: Side,
    /// Order quantity (unsigned)
    pub quantity: Qty,
    /// Limit price, if any
    pub limit_price: Option<Px>,
    /// Opaque strategy tag carried through to fills
    pub tag: String,
}

impl OrderTicket {
    /// Notional value of the order at its limit price, zero for market orders
    #[must_use]
    pub fn notional(&self) -> i64 {
        self.limit_price.map_or(0, |px| px.mul_qty(self.quantity))
    }
}
