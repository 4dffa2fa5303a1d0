//! Orders as created by `POST /orders` and listed by the order endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, FoodId, OrderId, OrderStatus, Price, UserId};

/// One ordered item with the unit price captured at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub food_id: FoodId,
    pub quantity: u32,
    pub price: Price,
}

impl OrderLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A recorded order. All status transitions happen server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<OrderLine>,
    pub total_amount: Price,
    pub user_location: Coordinates,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload line of `POST /orders`.
pub type NewOrderLine = OrderLine;

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub user_location: Coordinates,
}

impl NewOrder {
    /// Total the server is expected to record for this order.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.items.iter().map(OrderLine::line_total).sum()
    }

    /// Number of item-units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_order() {
        let order: Order = serde_json::from_str(
            r#"{
                "_id": "o1",
                "userId": "u1",
                "items": [
                    {"foodId": "a", "quantity": 1, "price": 50},
                    {"foodId": "b", "quantity": 2, "price": 30}
                ],
                "totalAmount": 110,
                "userLocation": {"lat": 12.97, "lng": 77.59},
                "status": "preparing",
                "createdAt": "2024-05-01T12:30:00.000Z"
            }"#,
        )
        .unwrap();

        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].line_total(), Price::from_rupees(60));
        assert_eq!(order.total_amount, Price::from_rupees(110));
    }

    #[test]
    fn test_new_order_wire_shape() {
        let order = NewOrder {
            items: vec![OrderLine {
                food_id: FoodId::new("a"),
                quantity: 2,
                price: Price::from_rupees(30),
            }],
            user_location: Coordinates { lat: 1.5, lng: 2.5 },
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["items"][0]["foodId"], "a");
        assert_eq!(json["items"][0]["quantity"], 2);
        assert_eq!(json["userLocation"]["lat"], 1.5);
        assert_eq!(order.item_count(), 2);
        assert_eq!(order.total_amount(), Price::from_rupees(60));
    }
}
