//! Order item entity: one row of the order_items join.

use domain::models::{CellValue, SheetRow};
use sqlx::FromRow;

pub const ORDER_ITEM_HEADERS: &[&str] = &[
    "OrderItemId",
    "OrderId",
    "OrderItemOrderNumber",
    "ItemCode",
    "ItemName",
    "ItemDescription",
    "ItemProductionDate",
    "ItemWeight",
    "ItemVolume",
    "Barcode",
    "OrderQty",
    "PickingQty",
    "PickPlace_W",
    "PickPlace_L",
    "PickPlace_B",
    "PutawayQty",
    "PutawayLocId",
    "ShippingNumber",
    "CurrCustomerId",
    "CurrCustomerName",
    "CurrCustomerPostCode",
    "CurrCustomerPhone",
    "CurrCustomerEmail",
];

/// Database row mapping for an order item with its stock, pick place, and
/// customer descriptors. `barcode` holds every barcode of the stock,
/// comma separated.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OrderItemEntity {
    pub id: i64,
    pub order_id: Option<i64>,
    pub order_sort_num: Option<i64>,
    pub item_code: Option<String>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub item_production_date: Option<String>,
    pub item_weight: Option<String>,
    pub item_volume: Option<String>,
    pub barcode: Option<String>,
    pub order_qty: Option<i64>,
    pub picking_qty: Option<i64>,
    pub pick_place_warehouse: Option<String>,
    pub pick_place_location: Option<String>,
    pub pick_place_box: Option<String>,
    pub putaway_qty: Option<i64>,
    pub putaway_pin: Option<String>,
    pub shipping_number: Option<String>,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_post_code: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

impl SheetRow for OrderItemEntity {
    fn headers() -> &'static [&'static str] {
        ORDER_ITEM_HEADERS
    }

    fn cells(&self) -> Vec<CellValue> {
        vec![
            CellValue::Integer(self.id),
            self.order_id.into(),
            self.order_sort_num.into(),
            (&self.item_code).into(),
            (&self.item_name).into(),
            (&self.item_description).into(),
            (&self.item_production_date).into(),
            CellValue::numeric_text(&self.item_weight),
            CellValue::numeric_text(&self.item_volume),
            (&self.barcode).into(),
            self.order_qty.into(),
            self.picking_qty.into(),
            (&self.pick_place_warehouse).into(),
            (&self.pick_place_location).into(),
            (&self.pick_place_box).into(),
            self.putaway_qty.into(),
            (&self.putaway_pin).into(),
            (&self.shipping_number).into(),
            self.customer_id.into(),
            (&self.customer_name).into(),
            (&self.customer_post_code).into(),
            (&self.customer_phone).into(),
            (&self.customer_email).into(),
        ]
    }
}
