//! Order item repository: the detail rows behind order exports.

use sqlx::MySqlPool;

use crate::entities::OrderItemEntity;
use crate::metrics::QueryTimer;

/// Repository for order item queries.
#[derive(Clone)]
pub struct OrderItemRepository {
    pool: MySqlPool,
}

impl OrderItemRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Every item of an order, one row per item with its barcodes joined.
    pub async fn find_by_order(&self, order_id: i64) -> Result<Vec<OrderItemEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_order_items_by_order");
        let result = sqlx::query_as::<_, OrderItemEntity>(
            r#"
            SELECT
                CAST(o.id AS SIGNED) AS id,
                CAST(o.order_id AS SIGNED) AS order_id,
                CAST(o.order_sort_num AS SIGNED) AS order_sort_num,
                CAST(s.code AS CHAR) AS item_code,
                CAST(s.name AS CHAR) AS item_name,
                CAST(s.feature AS CHAR) AS item_description,
                CAST(s.production_date AS CHAR) AS item_production_date,
                CAST(s.weight AS CHAR) AS item_weight,
                CAST(s.volume AS CHAR) AS item_volume,
                CAST(GROUP_CONCAT(bc.barcode) AS CHAR) AS barcode,
                CAST(o.orderQty AS SIGNED) AS order_qty,
                CAST(o.pickingQty AS SIGNED) AS picking_qty,
                CAST(w.name AS CHAR) AS pick_place_warehouse,
                CAST(l.name AS CHAR) AS pick_place_location,
                CAST(bx.name AS CHAR) AS pick_place_box,
                CAST(o.putawayQty AS SIGNED) AS putaway_qty,
                CAST(o.putaway_pin AS CHAR) AS putaway_pin,
                CAST(o.shipping_number AS CHAR) AS shipping_number,
                CAST(c.id AS SIGNED) AS customer_id,
                CAST(c.name AS CHAR) AS customer_name,
                CAST(c.post_code AS CHAR) AS customer_post_code,
                CAST(c.phone AS CHAR) AS customer_phone,
                CAST(c.email AS CHAR) AS customer_email
            FROM order_items o
            LEFT JOIN current_stocks cs ON cs.id = o.curr_stk_id
            LEFT JOIN stocks s ON s.id = cs.stock_id
            LEFT JOIN barcodes bc ON bc.curr_stk_id = cs.id
            LEFT JOIN boxes bx ON bx.id = cs.box_id
            LEFT JOIN locations l ON l.id = bx.location_id
            LEFT JOIN warehouses w ON w.id = l.warehouse_id
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.order_id = ?
            GROUP BY o.id
            ORDER BY o.id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
