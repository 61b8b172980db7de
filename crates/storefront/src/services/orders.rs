//! Order registry.
//!
//! Records placed orders, drives status changes through the state machine and
//! triggers the matching customer notification. Persistence sits behind
//! [`OrderRepository`] so the registry can be exercised without a store.

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use binder_core::{OrderId, OrderStatus};

use crate::models::{Order, OrderDraft, TransitionError};
use crate::storage::{self, SharedStore, StorageError, keys};

use super::notify::EmailService;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No order with this id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The state machine does not allow this change.
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Orders could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Where orders are kept.
pub trait OrderRepository: Send + Sync {
    /// Load every order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn load(&self) -> Result<Vec<Order>, StorageError>;

    /// Replace the stored order list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn save(&self, orders: &[Order]) -> Result<(), StorageError>;
}

/// Orders kept as one JSON list under the `orders` key.
pub struct StoredOrders {
    store: SharedStore,
}

impl StoredOrders {
    #[must_use]
    pub const fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

impl OrderRepository for StoredOrders {
    fn load(&self) -> Result<Vec<Order>, StorageError> {
        Ok(storage::load_json(self.store.as_ref(), keys::ORDERS)?.unwrap_or_default())
    }

    fn save(&self, orders: &[Order]) -> Result<(), StorageError> {
        storage::save_json(self.store.as_ref(), keys::ORDERS, orders)
    }
}

/// A freshly placed order and whether its confirmation went out.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: Order,
    pub confirmation_sent: bool,
}

/// Result of a status change.
///
/// The change itself always succeeded when this is returned; `email_error`
/// only reports the notification.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub order: Order,
    pub email_sent: bool,
    pub email_error: Option<String>,
}

/// Every order, in placement order.
pub struct OrderRegistry<R> {
    repository: R,
    orders: Vec<Order>,
}

impl<R: OrderRepository> OrderRegistry<R> {
    /// Load orders from `repository`. Unreadable data starts an empty list.
    pub fn open(repository: R) -> Self {
        let orders = repository.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable orders");
            Vec::new()
        });
        Self { repository, orders }
    }

    /// All orders, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<&Order> {
        let mut orders: Vec<_> = self.orders.iter().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    /// Orders currently in `status`, newest first.
    #[must_use]
    pub fn list_by_status(&self, status: OrderStatus) -> Vec<&Order> {
        self.list()
            .into_iter()
            .filter(|o| o.status == status)
            .collect()
    }

    /// Look up an order.
    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether there are no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Record a new order and send its confirmation.
    ///
    /// A failed confirmation is logged; the order stays placed.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Storage` if the order list cannot be written.
    #[instrument(skip(self, draft, email), fields(customer = %draft.customer_email))]
    pub async fn place(&mut self, draft: OrderDraft, email: &EmailService) -> Result<PlacedOrder, OrderError> {
        let order = Order::from_draft(draft, Utc::now());
        self.orders.push(order.clone());
        if let Err(e) = self.repository.save(&self.orders) {
            self.orders.pop();
            return Err(e.into());
        }
        tracing::info!(order_id = %order.id, total = %order.total, status = %order.status, "Order placed");

        let confirmation_sent = match email.send_order_confirmation(&order).await {
            Ok(outcome) => outcome.is_sent(),
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Order confirmation failed");
                false
            }
        };

        Ok(PlacedOrder {
            order,
            confirmation_sent,
        })
    }

    /// Move an order to `status` and notify the customer.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound`, `OrderError::InvalidTransition` (order
    /// untouched) or `OrderError::Storage` (change rolled back in memory).
    #[instrument(skip(self, note, email), fields(order_id = %id, status = %status))]
    pub async fn update_status(
        &mut self,
        id: &OrderId,
        status: OrderStatus,
        note: Option<String>,
        email: &EmailService,
    ) -> Result<StatusUpdate, OrderError> {
        let index = self
            .orders
            .iter()
            .position(|o| &o.id == id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;

        let previous = self.orders[index].clone();
        self.orders[index].transition(status, note.clone(), Utc::now())?;
        if let Err(e) = self.repository.save(&self.orders) {
            self.orders[index] = previous;
            return Err(e.into());
        }
        let order = self.orders[index].clone();
        tracing::info!(from = %previous.status, "Order status updated");

        let (email_sent, email_error) = if status.notifies_customer() {
            match email
                .send_status_update(&order, status, note.as_deref())
                .await
            {
                Ok(outcome) => (outcome.is_sent(), None),
                Err(e) => {
                    tracing::warn!(error = %e, "Status email failed");
                    (false, Some(e.to_string()))
                }
            }
        } else {
            (false, None)
        };

        Ok(StatusUpdate {
            order,
            email_sent,
            email_error,
        })
    }

    /// Remove an order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Storage`.
    pub fn delete(&mut self, id: &OrderId) -> Result<Order, OrderError> {
        let index = self
            .orders
            .iter()
            .position(|o| &o.id == id)
            .ok_or_else(|| OrderError::NotFound(id.clone()))?;
        let removed = self.orders.remove(index);
        if let Err(e) = self.repository.save(&self.orders) {
            self.orders.insert(index, removed);
            return Err(e.into());
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use binder_core::TemplateId;

    use super::*;
    use crate::models::order::tests::sample_order;
    use crate::services::notify::{DeliveryMode, EmailSettings};
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct FlakyRepo {
        saved: Mutex<Vec<Order>>,
        fail: Mutex<bool>,
    }

    impl OrderRepository for Arc<FlakyRepo> {
        fn load(&self) -> Result<Vec<Order>, StorageError> {
            Ok(self.saved.lock().unwrap().clone())
        }

        fn save(&self, orders: &[Order]) -> Result<(), StorageError> {
            if *self.fail.lock().unwrap() {
                return Err(StorageError::InvalidKey("orders".to_owned()));
            }
            *self.saved.lock().unwrap() = orders.to_vec();
            Ok(())
        }
    }

    fn email() -> EmailService {
        EmailService::open(Arc::new(MemoryStore::new()), "Binder TCG").unwrap()
    }

    fn draft(status: OrderStatus) -> OrderDraft {
        let order = sample_order(status);
        OrderDraft {
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            totals: binder_core::pricing::Totals {
                subtotal: order.subtotal,
                shipping: order.shipping,
                tax: order.tax,
                total: order.total,
            },
            items: order.items,
            shipping_address: order.shipping_address,
            payment_method: order.payment_method,
            payment_id: order.payment_id,
            status,
        }
    }

    #[tokio::test]
    async fn test_place_persists_and_confirms() {
        let shared: SharedStore = Arc::new(MemoryStore::new());
        let email = email();
        let mut registry = OrderRegistry::open(StoredOrders::new(shared.clone()));

        let placed = registry.place(draft(OrderStatus::Paid), &email).await.unwrap();
        assert!(placed.confirmation_sent);
        assert_eq!(email.outbox().sent().len(), 1);

        let reopened = OrderRegistry::open(StoredOrders::new(shared));
        assert_eq!(reopened.get(&placed.order.id), Some(&placed.order));
    }

    #[tokio::test]
    async fn test_status_update_appends_history_and_emails() {
        let email = email();
        let mut registry = OrderRegistry::open(Arc::new(FlakyRepo::default()));
        let id = registry.place(draft(OrderStatus::Paid), &email).await.unwrap().order.id;

        let update = registry
            .update_status(&id, OrderStatus::Processing, Some("Pulling cards".to_owned()), &email)
            .await
            .unwrap();
        assert!(update.email_sent);
        assert!(update.email_error.is_none());
        assert_eq!(update.order.status_history.len(), 2);
        assert_eq!(
            update.order.status_history[1].note.as_deref(),
            Some("Pulling cards")
        );
        let last = email.outbox().sent().pop().unwrap();
        assert!(last.message.html.contains("Pulling cards"));
    }

    #[tokio::test]
    async fn test_delivered_without_template_still_succeeds() {
        let mut email = email();
        email.delete_template(&TemplateId::for_status(OrderStatus::Delivered));
        let mut registry = OrderRegistry::open(Arc::new(FlakyRepo::default()));
        let id = registry.place(draft(OrderStatus::Paid), &email).await.unwrap().order.id;

        for status in [OrderStatus::Processing, OrderStatus::Shipped] {
            registry.update_status(&id, status, None, &email).await.unwrap();
        }
        let update = registry
            .update_status(&id, OrderStatus::Delivered, None, &email)
            .await
            .unwrap();
        assert_eq!(update.order.status, OrderStatus::Delivered);
        assert!(!update.email_sent);
        assert!(update.email_error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_history_intact() {
        let email = email();
        let mut registry = OrderRegistry::open(Arc::new(FlakyRepo::default()));
        let id = registry.place(draft(OrderStatus::Paid), &email).await.unwrap().order.id;
        registry.update_status(&id, OrderStatus::Cancelled, None, &email).await.unwrap();

        let err = registry
            .update_status(&id, OrderStatus::Pending, None, &email)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::InvalidTransition(_)));
        let order = registry.get(&id).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.status_history.len(), 2);
    }

    #[tokio::test]
    async fn test_email_failure_does_not_roll_back() {
        let mut email = email();
        email.save_settings(EmailSettings {
            mode: DeliveryMode::Relay,
            relay_url: "http://127.0.0.1:9".to_owned(),
            ..EmailSettings::default()
        });
        let mut registry = OrderRegistry::open(Arc::new(FlakyRepo::default()));
        let placed = registry.place(draft(OrderStatus::Paid), &email).await.unwrap();
        assert!(!placed.confirmation_sent);

        let update = registry
            .update_status(&placed.order.id, OrderStatus::Processing, None, &email)
            .await
            .unwrap();
        assert_eq!(update.order.status, OrderStatus::Processing);
        assert!(!update.email_sent);
        assert!(update.email_error.is_some());
    }

    #[tokio::test]
    async fn test_storage_failure_rolls_back() {
        let email = email();
        let repo = Arc::new(FlakyRepo::default());
        let mut registry = OrderRegistry::open(repo.clone());
        let id = registry.place(draft(OrderStatus::Paid), &email).await.unwrap().order.id;

        *repo.fail.lock().unwrap() = true;
        let err = registry
            .update_status(&id, OrderStatus::Processing, None, &email)
            .await
            .unwrap_err();
        assert!(matches!(err, OrderError::Storage(_)));
        assert_eq!(registry.get(&id).unwrap().status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filter() {
        let email = email();
        let mut registry = OrderRegistry::open(Arc::new(FlakyRepo::default()));
        let first = registry.place(draft(OrderStatus::Paid), &email).await.unwrap().order.id;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = registry.place(draft(OrderStatus::Pending), &email).await.unwrap().order.id;

        let ids: Vec<_> = registry.list().into_iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![second, first.clone()]);
        let paid: Vec<_> = registry
            .list_by_status(OrderStatus::Paid)
            .into_iter()
            .map(|o| o.id.clone())
            .collect();
        assert_eq!(paid, vec![first]);
    }
}
