//! Order log repository: the activity history behind order log exports.

use chrono::NaiveDateTime;
use sqlx::MySqlPool;

use crate::entities::OrderLogEntity;
use crate::metrics::QueryTimer;

/// Repository for order log queries.
#[derive(Clone)]
pub struct OrderLogRepository {
    pool: MySqlPool,
}

impl OrderLogRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Log entries created within `[min, max]` (store time), optionally
    /// restricted to one `action`, in ascending `created_at` order.
    pub async fn find_between(
        &self,
        min: NaiveDateTime,
        max: NaiveDateTime,
        action: Option<&str>,
    ) -> Result<Vec<OrderLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_order_logs_between");
        let result = sqlx::query_as::<_, OrderLogEntity>(
            r#"
            SELECT
                CAST(ol.id AS SIGNED) AS id,
                CAST(ol.order_id AS SIGNED) AS order_id,
                CAST(ol.order_item_id AS SIGNED) AS order_item_id,
                CAST(ol.order_sort_num AS SIGNED) AS order_sort_num,
                CAST(s.code AS CHAR) AS item_code,
                CAST(s.name AS CHAR) AS item_name,
                CAST(s.feature AS CHAR) AS item_description,
                CAST(s.production_date AS CHAR) AS item_production_date,
                CAST(s.weight AS CHAR) AS item_weight,
                CAST(s.volume AS CHAR) AS item_volume,
                CAST(ol.used_barcode_num AS CHAR) AS barcode,
                CAST(ol.orderQty AS SIGNED) AS order_qty,
                CAST(ol.pickingQty AS SIGNED) AS picking_qty,
                CAST(w.name AS CHAR) AS pick_place_warehouse,
                CAST(l.name AS CHAR) AS pick_place_location,
                CAST(b.name AS CHAR) AS pick_place_box,
                CAST(ol.putawayQty AS SIGNED) AS putaway_qty,
                CAST(ol.putaway_pin AS CHAR) AS putaway_pin,
                CAST(ol.shipping_number AS CHAR) AS shipping_number,
                CAST(c.id AS SIGNED) AS customer_id,
                CAST(c.name AS CHAR) AS customer_name,
                CAST(c.post_code AS CHAR) AS customer_post_code,
                CAST(c.phone AS CHAR) AS customer_phone,
                CAST(c.email AS CHAR) AS customer_email,
                CAST(ol.action AS CHAR) AS action,
                ol.created_at AS created_at,
                CAST(u.name AS CHAR) AS created_by
            FROM orders_logs ol
            LEFT JOIN current_stocks cs ON cs.id = ol.curr_stk_id
            LEFT JOIN stocks s ON s.id = cs.stock_id
            LEFT JOIN boxes b ON b.id = cs.box_id
            LEFT JOIN locations l ON l.id = b.location_id
            LEFT JOIN warehouses w ON w.id = l.warehouse_id
            LEFT JOIN customers c ON c.id = ol.customer_id
            LEFT JOIN users u ON u.id = ol.created_by
            WHERE ol.created_at BETWEEN ? AND ?
              AND (? IS NULL OR ol.action = ?)
            ORDER BY ol.created_at ASC, ol.id ASC
            "#,
        )
        .bind(min)
        .bind(max)
        .bind(action)
        .bind(action)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
