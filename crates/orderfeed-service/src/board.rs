//! The shared order-list container.

use tokio::sync::{RwLock, watch};
use tracing::debug;

use orderfeed_core::types::{OrderId, OrderRecord, OrderStatus};

/// Newest-first list of orders shown by a view.
///
/// Writers are the refresh path (whole-list replace), the live feed
/// (prepend), and the order controller (single-record patch). Whichever
/// write lands last wins. Every write bumps a revision that views watch to
/// re-render.
#[derive(Debug)]
pub struct OrderBoard {
    orders: RwLock<Vec<OrderRecord>>,
    revision: watch::Sender<u64>,
}

impl OrderBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            orders: RwLock::new(Vec::new()),
            revision,
        }
    }

    /// Replace the whole list with an authoritative snapshot.
    pub async fn replace_all(&self, orders: Vec<OrderRecord>) {
        let count = orders.len();
        *self.orders.write().await = orders;
        self.bump();
        debug!(count = count, "Order board replaced");
    }

    /// Insert a new order at the top. No deduplication is applied.
    pub async fn prepend(&self, order: OrderRecord) {
        debug!(order_id = %order.order_id, "Order prepended");
        self.orders.write().await.insert(0, order);
        self.bump();
    }

    /// Set the status of one order, leaving the rest of the list untouched.
    ///
    /// Returns the patched record, or `None` when the order is not on the board.
    pub async fn patch_status(&self, order_id: OrderId, status: OrderStatus) -> Option<OrderRecord> {
        let patched = {
            let mut orders = self.orders.write().await;
            let record = orders.iter_mut().find(|o| o.order_id == order_id)?;
            record.status = status;
            record.clone()
        };
        self.bump();
        Some(patched)
    }

    /// Swap in an updated record in place, or prepend it if it is not listed.
    pub async fn replace_one(&self, order: OrderRecord) {
        {
            let mut orders = self.orders.write().await;
            match orders.iter_mut().find(|o| o.order_id == order.order_id) {
                Some(slot) => *slot = order,
                None => orders.insert(0, order),
            }
        }
        self.bump();
    }

    /// Look up one order.
    pub async fn get(&self, order_id: OrderId) -> Option<OrderRecord> {
        self.orders
            .read()
            .await
            .iter()
            .find(|o| o.order_id == order_id)
            .cloned()
    }

    /// Copy of the current list.
    pub async fn snapshot(&self) -> Vec<OrderRecord> {
        self.orders.read().await.clone()
    }

    /// Number of listed orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Whether the board holds no orders.
    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Current revision.
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Watch revisions; the receiver wakes on every write.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for OrderBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::order;

    #[tokio::test]
    async fn test_prepend_puts_new_order_first() {
        let board = OrderBoard::new();
        let first = order(OrderStatus::Pending);
        let second = order(OrderStatus::Preparing);
        board.replace_all(vec![first.clone()]).await;

        board.prepend(second.clone()).await;

        let list = board.snapshot().await;
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].order_id, second.order_id);
        assert_eq!(list[1].order_id, first.order_id);
    }

    #[tokio::test]
    async fn test_prepend_does_not_dedup() {
        let board = OrderBoard::new();
        let record = order(OrderStatus::Pending);
        board.prepend(record.clone()).await;
        board.prepend(record).await;
        assert_eq!(board.len().await, 2);
    }

    #[tokio::test]
    async fn test_patch_status_touches_only_target() {
        let board = OrderBoard::new();
        let a = order(OrderStatus::Pending);
        let b = order(OrderStatus::Pending);
        board.replace_all(vec![a.clone(), b.clone()]).await;

        let patched = board
            .patch_status(a.order_id, OrderStatus::Cancelled)
            .await
            .expect("listed");

        assert_eq!(patched.status, OrderStatus::Cancelled);
        assert_eq!(board.get(b.order_id).await.expect("b").status, OrderStatus::Pending);
        assert!(board.patch_status(OrderId(999_999), OrderStatus::Cancelled).await.is_none());
    }

    #[tokio::test]
    async fn test_writes_bump_revision() {
        let board = OrderBoard::new();
        let mut rx = board.subscribe();
        assert_eq!(board.revision(), 0);

        board.prepend(order(OrderStatus::Pending)).await;

        rx.changed().await.expect("changed");
        assert_eq!(*rx.borrow(), 1);
    }

    #[tokio::test]
    async fn test_replace_one_in_place() {
        let board = OrderBoard::new();
        let a = order(OrderStatus::Pending);
        let b = order(OrderStatus::Pending);
        board.replace_all(vec![a.clone(), b.clone()]).await;

        let mut updated = b.clone();
        updated.status = OrderStatus::Preparing;
        board.replace_one(updated).await;

        let list = board.snapshot().await;
        assert_eq!(list[1].order_id, b.order_id);
        assert_eq!(list[1].status, OrderStatus::Preparing);
    }
}
