//! Independent per-account cash and holdings ledger
//!
//! Each configured account owns exactly one ledger with its own base
//! currency. The aggregate ledger is the same type flagged derived: its
//! cash table is rebuilt by the conversion coordinator and its totals are
//! never read as authoritative by the manager.

use crate::conversion::ConversionHandle;
use rustc_hash::FxHashMap;
use services_common::{Fill, Instrument, Px, SCALE_4, Side, Symbol};
use tracing::{debug, warn};

/// One currency balance plus its conversion state
#[derive(Debug, Clone)]
pub struct CashEntry {
    /// Currency code, e.g. "USD", "USDC"
    pub currency: String,
    /// Balance in fixed-point
    pub amount: i64,
    /// Shared conversion handle into the ledger's base currency; `None`
    /// until the coordinator registers one
    pub conversion: Option<ConversionHandle>,
    /// Pegged 1:1 to the settlement currency, no subscription needed
    pub pegged: bool,
}

impl CashEntry {
    /// Balance expressed in the ledger's base currency
    ///
    /// A pending (zero) rate values the entry at zero; that is a transient
    /// state resolved by the next reconciliation pass.
    #[must_use]
    pub fn value_in_base(&self, base_currency: &str) -> i64 {
        if self.currency == base_currency || self.pegged {
            return self.amount;
        }
        self.conversion
            .as_ref()
            .map_or(0, |handle| handle.to_base(self.amount))
    }
}

/// A held instrument position
#[derive(Debug, Clone)]
pub struct Holding {
    /// The instrument, carrying its routing attributes and quote currency
    pub instrument: Instrument,
    /// Signed quantity in fixed-point units (positive long, negative short)
    pub quantity: i64,
    /// Average entry price
    pub avg_price: Px,
}

impl Holding {
    /// Signed notional at average price, in quote-currency ticks
    #[must_use]
    pub fn signed_notional(&self) -> i64 {
        (self.avg_price.as_i64() * self.quantity) / SCALE_4
    }

    /// Absolute notional at average price
    #[must_use]
    pub fn gross_notional(&self) -> i64 {
        self.signed_notional().abs()
    }
}

/// Independent cash + holdings ledger for one account
pub struct SubAccountLedger {
    name: String,
    base_currency: String,
    derived: bool,
    /// Fraction of gross holding notional held as margin (SCALE_4 = 100%)
    margin_rate: i64,
    cash: FxHashMap<String, CashEntry>,
    holdings: FxHashMap<Symbol, Holding>,
}

impl SubAccountLedger {
    /// Create a ledger for a configured account with its initial cash
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        base_currency: impl Into<String>,
        initial_cash: i64,
    ) -> Self {
        let base_currency = base_currency.into();
        let mut cash = FxHashMap::default();
        cash.insert(
            base_currency.clone(),
            CashEntry {
                currency: base_currency.clone(),
                amount: initial_cash,
                conversion: None,
                pegged: false,
            },
        );
        Self {
            name: name.into(),
            base_currency,
            derived: false,
            margin_rate: SCALE_4,
            cash,
            holdings: FxHashMap::default(),
        }
    }

    /// Create the derived aggregate ledger
    #[must_use]
    pub fn derived(name: impl Into<String>, base_currency: impl Into<String>) -> Self {
        let mut ledger = Self::new(name, base_currency, 0);
        ledger.derived = true;
        ledger
    }

    /// Account name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base currency this account settles in
    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// True for the aggregate view, whose state is never authoritative
    #[must_use]
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// Set the margin rate (SCALE_4 = fully funded)
    pub fn set_margin_rate(&mut self, rate: i64) {
        self.margin_rate = rate;
    }

    /// Credit (or debit, if negative) a currency balance
    pub fn deposit(&mut self, currency: &str, amount: i64) {
        self.cash_entry_mut(currency).amount += amount;
    }

    /// Balance for a currency, if the entry exists
    #[must_use]
    pub fn cash_balance(&self, currency: &str) -> Option<i64> {
        self.cash.get(currency).map(|e| e.amount)
    }

    /// Cash entry for a currency, if present
    #[must_use]
    pub fn cash_entry(&self, currency: &str) -> Option<&CashEntry> {
        self.cash.get(currency)
    }

    /// Cash entry for a currency, created as a zero-rate placeholder when
    /// absent so a later conversion-initialization pass can complete it
    pub fn cash_entry_mut(&mut self, currency: &str) -> &mut CashEntry {
        self.cash
            .entry(currency.to_string())
            .or_insert_with(|| CashEntry {
                currency: currency.to_string(),
                amount: 0,
                conversion: None,
                pegged: false,
            })
    }

    /// Iterate all cash entries
    pub fn cash_entries(&self) -> impl Iterator<Item = &CashEntry> {
        self.cash.values()
    }

    /// Iterate all cash entries mutably
    pub fn cash_entries_mut(&mut self) -> impl Iterator<Item = &mut CashEntry> {
        self.cash.values_mut()
    }

    /// The full currency table (cash book)
    #[must_use]
    pub fn cash_book(&self) -> &FxHashMap<String, CashEntry> {
        &self.cash
    }

    /// Zero every balance, keeping entries and conversion handles intact
    pub fn zero_cash(&mut self) {
        for entry in self.cash.values_mut() {
            entry.amount = 0;
        }
    }

    /// Add an instrument to this ledger
    ///
    /// Returns false when the instrument is already held; an instrument
    /// belongs to one ledger for its entire lifetime.
    pub fn add_instrument(&mut self, instrument: Instrument) -> bool {
        if self.holdings.contains_key(&instrument.symbol) {
            return false;
        }
        debug!(
            account = %self.name,
            instrument = %instrument,
            "instrument added to ledger"
        );
        self.holdings.insert(
            instrument.symbol,
            Holding {
                instrument,
                quantity: 0,
                avg_price: Px::ZERO,
            },
        );
        true
    }

    /// True when this ledger owns the instrument
    #[must_use]
    pub fn has_instrument(&self, symbol: Symbol) -> bool {
        self.holdings.contains_key(&symbol)
    }

    /// Holding for an instrument, if owned here
    #[must_use]
    pub fn holding(&self, symbol: Symbol) -> Option<&Holding> {
        self.holdings.get(&symbol)
    }

    /// Iterate all holdings
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    /// Apply a fill to the owned holding and its quote-currency cash
    ///
    /// Average price follows the usual weighted rule: extended positions
    /// re-weight, reduced positions keep their basis, flipped positions
    /// restart at the fill price.
    pub fn process_fill(&mut self, side: Side, fill: &Fill) {
        let Some(holding) = self.holdings.get_mut(&fill.symbol) else {
            warn!(
                account = %self.name,
                symbol = %fill.symbol,
                "fill for instrument not owned by this ledger, skipped"
            );
            return;
        };

        let qty_delta = side.sign() * fill.quantity.as_i64();
        let old_qty = holding.quantity;
        let new_qty = old_qty + qty_delta;

        if new_qty == 0 {
            holding.avg_price = Px::ZERO;
        } else if old_qty == 0 || old_qty.signum() != new_qty.signum() {
            // Opening or flipping: basis restarts at the fill price
            holding.avg_price = fill.price;
        } else if qty_delta.signum() == old_qty.signum() {
            // Extending: weighted average of old basis and fill price
            let old_value = holding.avg_price.as_i64() * old_qty.abs();
            let new_value = fill.price.as_i64() * qty_delta.abs();
            holding.avg_price = Px::from_i64((old_value + new_value) / new_qty.abs());
        }
        // Reducing without flipping keeps the basis.
        holding.quantity = new_qty;

        // Cash moves in the instrument's quote currency: buys debit,
        // sells credit.
        let quote = holding.instrument.quote_currency.clone();
        let cash_flow = -side.sign() * fill.price.mul_qty(fill.quantity);
        self.deposit(&quote, cash_flow);
    }

    /// Total cash expressed in the base currency
    #[must_use]
    pub fn total_cash(&self) -> i64 {
        self.cash
            .values()
            .map(|e| e.value_in_base(&self.base_currency))
            .sum()
    }

    /// Signed value of all holdings in the base currency
    #[must_use]
    pub fn holdings_value(&self) -> i64 {
        self.holdings
            .values()
            .map(|h| self.quote_to_base(&h.instrument.quote_currency, h.signed_notional()))
            .sum()
    }

    /// Total account value: cash plus holdings
    #[must_use]
    pub fn total_value(&self) -> i64 {
        self.total_cash() + self.holdings_value()
    }

    /// Margin consumed by open holdings
    #[must_use]
    pub fn margin_used(&self) -> i64 {
        self.holdings
            .values()
            .map(|h| {
                let gross = self.quote_to_base(&h.instrument.quote_currency, h.gross_notional());
                (gross * self.margin_rate) / SCALE_4
            })
            .sum()
    }

    /// Cash available for new orders
    #[must_use]
    pub fn buying_power(&self) -> i64 {
        self.total_cash() - self.margin_used()
    }

    fn quote_to_base(&self, quote_currency: &str, amount: i64) -> i64 {
        if quote_currency == self.base_currency {
            return amount;
        }
        match self.cash.get(quote_currency) {
            Some(entry) if entry.pegged => amount,
            Some(entry) => entry
                .conversion
                .as_ref()
                .map_or(0, |handle| handle.to_base(amount)),
            None => 0,
        }
    }
}
