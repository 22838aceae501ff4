//! Synthetic order records and the pre-generated pools they draw from.
//!
//! Write operations reference pooled customers and catalog items instead of
//! generating fresh ones per call, so that the same customer places several
//! orders and the same item is ordered multiple times. Pools are filled once
//! before any worker starts and are only read afterwards.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::{SeedableRng, random};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Dennis", "Donald", "Edsger", "Frances", "Grace", "John",
    "Katherine", "Ken", "Leslie", "Lynn", "Margaret", "Niklaus", "Radia", "Robin", "Tony", "Vint",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Baker", "Carter", "Diaz", "Evans", "Foster", "Green", "Hayes", "Irwin", "Jordan",
    "Keller", "Lane", "Morgan", "Nolan", "Ortiz", "Parker", "Quinn", "Reed", "Shaw", "Turner",
];

const STREET_NAMES: &[&str] = &[
    "Cedar", "Chestnut", "Elm", "Highland", "Lake", "Maple", "Oak", "Park", "Pine", "Walnut",
];

const STREET_SUFFIXES: &[&str] = &["Ave", "Blvd", "Ct", "Dr", "Ln", "Rd", "St", "Way"];

const STATES: &[&str] = &[
    "AZ", "CA", "CO", "FL", "GA", "IL", "MA", "NC", "NJ", "NY", "OH", "OR", "PA", "TX", "VA", "WA",
];

const ITEM_ADJECTIVES: &[&str] = &[
    "Compact", "Deluxe", "Ergonomic", "Foldable", "Heavy-Duty", "Portable", "Rustic", "Sleek",
    "Sturdy", "Wireless",
];

const ITEM_PRODUCTS: &[&str] = &[
    "Backpack", "Chair", "Desk Lamp", "Headphones", "Kettle", "Keyboard", "Monitor Stand",
    "Notebook", "Speaker", "Water Bottle",
];

const ITEM_CATEGORIES: &[&str] = &["electronics", "furniture", "kitchen", "office", "outdoors"];

/// A synthetic customer placing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer id.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email address.
    pub email: String,
    /// Street address.
    pub street_address: String,
    /// Postal code.
    pub zip_code: String,
    /// Two-letter state code.
    pub state: String,
}

impl Customer {
    /// Generates a random customer.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let first_name = *FIRST_NAMES.choose(rng).unwrap();
        let last_name = *LAST_NAMES.choose(rng).unwrap();
        let email = format!(
            "{}.{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase()
        );
        let street_address = format!(
            "{} {} {}",
            rng.random_range(1..=9999),
            STREET_NAMES.choose(rng).unwrap(),
            STREET_SUFFIXES.choose(rng).unwrap(),
        );

        Self {
            id: Uuid::new_v4().to_string(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            email,
            street_address,
            zip_code: format!("{:05}", rng.random_range(0..100_000)),
            state: (*STATES.choose(rng).unwrap()).to_owned(),
        }
    }
}

/// A synthetic catalog item that orders refer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique item id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Catalog category.
    pub category: String,
    /// Unit price.
    pub price: f64,
}

impl CatalogItem {
    /// Generates a random catalog item.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let name = format!(
            "{} {}",
            ITEM_ADJECTIVES.choose(rng).unwrap(),
            ITEM_PRODUCTS.choose(rng).unwrap()
        );

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            category: (*ITEM_CATEGORIES.choose(rng).unwrap()).to_owned(),
            price: rng.random_range(100..=50_000) as f64 / 100.0,
        }
    }
}

/// How an order was paid for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentInstrument {
    /// Paid by credit card.
    CreditCard,
    /// Paid by debit card.
    DebitCard,
    /// Paid by bank transfer.
    BankTransfer,
    /// Paid from store credit.
    StoreCredit,
}

impl PaymentInstrument {
    fn generate(rng: &mut impl Rng) -> Self {
        match rng.random_range(0..4) {
            0 => Self::CreditCard,
            1 => Self::DebitCard,
            2 => Self::BankTransfer,
            _ => Self::StoreCredit,
        }
    }
}

/// A synthetic order, the record written by insert operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique order id.
    pub id: String,
    /// Unix timestamp of order placement, in seconds.
    pub order_time: u64,
    /// Order status, always `"NEW"` for fresh orders.
    pub status: String,
    /// The ordered item, drawn from the item pool.
    pub item: CatalogItem,
    /// Number of units ordered.
    pub quantity: u64,
    /// How the order was paid for.
    pub payment_instrument: PaymentInstrument,
    /// Purchase order number, shaped `###-#####-##`.
    pub purchase_order_number: String,
    /// The ordering customer, drawn from the customer pool.
    pub customer: Customer,
    /// Unix timestamp of the planned shipment, in seconds.
    pub shipping_date: u64,
    /// Padding for record size.
    pub data: Vec<u8>,
}

impl Order {
    /// Generates a fresh order referencing pooled customers and items.
    pub fn generate(pools: &Pools, rng: &mut impl Rng) -> Self {
        let now = unix_now();
        let shipping_days = rng.random_range(0..=10);

        Self {
            id: Uuid::new_v4().to_string(),
            order_time: now,
            status: "NEW".to_owned(),
            item: pools.items.sample(rng).clone(),
            quantity: rng.random_range(1..=100),
            payment_instrument: PaymentInstrument::generate(rng),
            purchase_order_number: format!(
                "{:03}-{:05}-{:02}",
                rng.random_range(0..1_000),
                rng.random_range(0..100_000),
                rng.random_range(0..100),
            ),
            customer: pools.customers.sample(rng).clone(),
            shipping_date: now + shipping_days * 24 * 60 * 60,
            data: rng.random::<[u8; 10]>().to_vec(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Requested more sequential entries from a pool than were allocated.
///
/// This is a configuration or programming error: exhaustible pools are sized
/// for the run up front and must never run dry mid-run.
#[derive(Clone, Copy, Debug)]
pub struct PoolExhausted {
    /// The fixed size the pool was allocated with.
    pub capacity: usize,
}

impl fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record pool exhausted after {} sequential entries",
            self.capacity
        )
    }
}

impl std::error::Error for PoolExhausted {}

/// A fixed-size, pre-generated pool of records.
///
/// The pool is filled at allocation time and never resized. Readers either
/// [`sample`](Self::sample) uniformly (repeatable, never exhausts) or consume
/// entries strictly once via [`try_next`](Self::try_next), which fails once
/// the pool runs dry.
#[derive(Debug)]
pub struct RecordPool<T> {
    records: Vec<T>,
    cursor: AtomicUsize,
}

impl<T> RecordPool<T> {
    /// Allocates a pool of `count` records produced by `generate`.
    pub fn allocate<F>(count: usize, mut generate: F) -> Self
    where
        F: FnMut(&mut SmallRng) -> T,
    {
        let mut rng = SmallRng::seed_from_u64(random());
        Self {
            records: (0..count).map(|_| generate(&mut rng)).collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    /// The fixed number of records in the pool.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the pool holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a uniformly sampled record.
    ///
    /// Pools consulted by operations are allocated before any worker starts;
    /// sampling an empty pool is a startup bug and panics.
    pub fn sample(&self, rng: &mut impl Rng) -> &T {
        &self.records[rng.random_range(0..self.records.len())]
    }

    /// Returns the next unconsumed record.
    ///
    /// Each record is handed out exactly once across all callers; the call
    /// fails once all records have been consumed.
    pub fn try_next(&self) -> Result<&T, PoolExhausted> {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.records.get(index).ok_or(PoolExhausted {
            capacity: self.records.len(),
        })
    }
}

/// The record pools a write run draws from.
#[derive(Debug)]
pub struct Pools {
    /// Customers placing orders; several orders reuse the same customer.
    pub customers: RecordPool<Customer>,
    /// Catalog items; the same item is ordered multiple times.
    pub items: RecordPool<CatalogItem>,
}

impl Pools {
    /// Allocates pools sized relative to the total operation count: four
    /// customers and two catalog items for every ten operations, at least one
    /// of each.
    pub fn allocate(total_operations: u64) -> Self {
        let customers = (total_operations * 4 / 10).max(1) as usize;
        let items = (total_operations * 2 / 10).max(1) as usize;

        Self {
            customers: RecordPool::allocate(customers, |rng| Customer::generate(rng)),
            items: RecordPool::allocate(items, |rng| CatalogItem::generate(rng)),
        }
    }

    /// Creates empty pools for runs that never sample them.
    pub fn empty() -> Self {
        Self {
            customers: RecordPool::allocate(0, |rng| Customer::generate(rng)),
            items: RecordPool::allocate(0, |rng| CatalogItem::generate(rng)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_ratios_follow_operation_count() {
        let pools = Pools::allocate(100);
        assert_eq!(pools.customers.len(), 40);
        assert_eq!(pools.items.len(), 20);

        // Tiny runs still get at least one of each.
        let pools = Pools::allocate(1);
        assert_eq!(pools.customers.len(), 1);
        assert_eq!(pools.items.len(), 1);
    }

    #[test]
    fn sampling_never_exhausts() {
        let pool = RecordPool::allocate(3, |rng| rng.random_range(0..u32::MAX));
        let mut rng = rand::rng();
        for _ in 0..10_000 {
            pool.sample(&mut rng);
        }
    }

    #[test]
    fn sequential_consumption_fails_after_capacity() {
        let pool = RecordPool::allocate(5, |_| ());
        for _ in 0..5 {
            pool.try_next().unwrap();
        }

        let err = pool.try_next().unwrap_err();
        assert_eq!(err.capacity, 5);
    }

    #[test]
    fn orders_reference_pooled_records() {
        let pools = Pools::allocate(10);
        let mut rng = rand::rng();
        let order = Order::generate(&pools, &mut rng);

        assert_eq!(order.status, "NEW");
        assert!((1..=100).contains(&order.quantity));
        assert!(order.shipping_date >= order.order_time);
        assert_eq!(order.data.len(), 10);

        let po = order.purchase_order_number.as_bytes();
        assert_eq!(po.len(), 12);
        assert_eq!(po[3], b'-');
        assert_eq!(po[9], b'-');
    }
}
