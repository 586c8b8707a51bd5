//! End-to-end tests of the cleaning pipeline over the built-in registry.

use ecom_cleaner::{
    MemorySink, MemorySource, Pipeline, PipelineError, PreparedRun, RawTable, Source, SourceError,
    TableCleaner, Value,
};
use ecom_core::{
    Entity, InputConfig, PipelineConfig, RemovalKind, RestrictMode, RuleConfig, SchemaRegistry,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(ecom_parser::builtin_registry().unwrap())
}

const ORDER_ITEM_HEADERS: &[&str] = &[
    "id",
    "order_id",
    "user_id",
    "product_id",
    "inventory_item_id",
    "status",
    "created_at",
    "shipped_at",
    "delivered_at",
    "returned_at",
    "sale_price",
];

/// A small store: one minor, one duplicate user, one underpriced product,
/// one order shipped before it was created (and its line), one negative
/// sale price, one unknown distribution center and one unreadable event.
fn store() -> MemorySource {
    MemorySource::new()
        .with_table(
            Entity::DistributionCenters,
            RawTable::from_strs(
                &["id", "name", "latitude", "longitude"],
                &[
                    &["1", "Memphis TN", "35.1175", "-89.9711"],
                    &["2", "  Chicago   IL ", "41.8369", "-87.6847"],
                ],
            ),
        )
        .with_table(
            Entity::Users,
            RawTable::from_strs(
                &[
                    "id", "first_name", "last_name", "email", "age", "city", "country",
                    "created_at", "traffic_source",
                ],
                &[
                    &["1", "ann", "smith", "Ann@Example.com", "34", "Rome", "italy", "2023-01-05 10:00:00", "Search"],
                    &["2", "bob", "jones", "bob@example.com", "16", "Oslo", "norway", "2023-02-01 09:00:00 UTC", "Email"],
                    &["3", "cara", "diaz", "cara@example.com", "41", "", "spain", "2023-03-01T08:00:00Z", "Organic"],
                    &["3", "dan", "diaz", "dan@example.com", "50", "Lima", "peru", "2023-03-02", "Search"],
                ],
            ),
        )
        .with_table(
            Entity::Products,
            RawTable::from_strs(
                &["id", "cost", "retail_price", "name", "brand", "category", "department"],
                &[
                    &["1", "10.50", "25.00", "Wool Hat", "Acme", "accessories", "Women"],
                    &["2", "5.00", "3.00", "Cheap Scarf", "Acme", "accessories", "Men"],
                    &["3", "2.00", "4.00", "", "", "", ""],
                ],
            ),
        )
        .with_table(
            Entity::InventoryItems,
            RawTable::from_strs(
                &[
                    "id", "product_id", "distribution_center_id", "created_at", "sold_at",
                    "cost", "product_retail_price", "product_name", "product_brand",
                ],
                &[
                    &["1", "1", "1", "2023-01-01 00:00:00", "2023-02-01 00:00:00", "10.50", "25.00", "Wool Hat", "Acme"],
                    &["2", "3", "99", "2023-01-01 00:00:00", "", "2.00", "4.00", "", ""],
                    &["3", "1", "2", "2023-01-02 00:00:00", "", "10.50", "25.00", "Wool Hat", "Acme"],
                ],
            ),
        )
        .with_table(
            Entity::Orders,
            RawTable::from_strs(
                &[
                    "order_id", "user_id", "status", "created_at", "shipped_at", "delivered_at",
                    "returned_at", "num_of_item",
                ],
                &[
                    &["10", "1", "Shipped", "2024-01-01 10:00:00", "2024-01-02 10:00:00", "", "", "1"],
                    &["11", "3", "Complete", "2024-01-01 10:00:00", "2024-01-02 10:00:00", "2024-01-04 10:00:00", "", "1"],
                    &["12", "1", "shipped", "2024-01-10 00:00:00", "2024-01-05 00:00:00", "", "", "1"],
                    &["13", "3", "pending", "2024-01-12 00:00:00", "", "", "", "2"],
                ],
            ),
        )
        .with_table(
            Entity::OrderItems,
            RawTable::from_strs(
                ORDER_ITEM_HEADERS,
                &[
                    &["100", "10", "1", "1", "1", "shipped", "2024-01-01 10:00:00", "2024-01-02 10:00:00", "", "", "25.00"],
                    &["101", "12", "1", "1", "3", "shipped", "2024-01-10 00:00:00", "", "", "", "25.00"],
                    &["102", "11", "3", "3", "2", "complete", "2024-01-01 10:00:00", "2024-01-02 10:00:00", "2024-01-04 10:00:00", "", "4.00"],
                    &["103", "13", "3", "3", "", "pending", "2024-01-12 00:00:00", "", "", "", "-1.00"],
                ],
            ),
        )
        .with_table(
            Entity::Events,
            RawTable::from_strs(
                &["id", "user_id", "sequence_number", "session_id", "event_type", "created_at", "city"],
                &[
                    &["1", "1", "1", "s-1", "home", "2024-01-01 10:00:00", "Rome"],
                    &["2", "2", "1", "s-2", "product", "2024-01-01 11:00:00", ""],
                    &["3", "", "1", "s-3", "cart", "2024-01-02 12:00:00", "Oslo"],
                    &["4", "1", "2", "s-1", "purchase", "yesterday", "Rome"],
                ],
            ),
        )
}

/// The store plus an order line for the product removed as underpriced.
fn store_with_dangling_product() -> MemorySource {
    let mut source = store();
    source.insert(
        Entity::OrderItems,
        RawTable::from_strs(
            ORDER_ITEM_HEADERS,
            &[
                &["100", "10", "1", "1", "1", "shipped", "2024-01-01 10:00:00", "2024-01-02 10:00:00", "", "", "25.00"],
                &["104", "10", "1", "2", "", "shipped", "2024-01-01 10:00:00", "", "", "", "3.00"],
            ],
        ),
    );
    source
}

fn ints(run: &PreparedRun, entity: Entity, column: &str) -> Vec<Option<i64>> {
    let table = run.table(entity).unwrap();
    table.column_values(column).map(Value::as_int).collect()
}

fn ids(run: &PreparedRun, entity: Entity, column: &str) -> Vec<i64> {
    ints(run, entity, column).into_iter().flatten().collect()
}

#[tokio::test]
async fn test_run_cleans_and_loads_in_dependency_order() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let mut sink = MemorySink::new();

    let run = pipeline.run(Arc::new(store()), &mut sink).await.unwrap();

    assert_eq!(
        sink.entities(),
        vec![
            Entity::DistributionCenters,
            Entity::Users,
            Entity::Products,
            Entity::InventoryItems,
            Entity::Orders,
            Entity::OrderItems,
            Entity::Events,
        ]
    );

    assert_eq!(ids(&run, Entity::Users, "id"), vec![1, 3]);
    assert_eq!(ids(&run, Entity::Products, "id"), vec![1, 3]);
    assert_eq!(ids(&run, Entity::InventoryItems, "id"), vec![1, 2, 3]);
    assert_eq!(ids(&run, Entity::Orders, "order_id"), vec![10, 11, 13]);
    assert_eq!(ids(&run, Entity::OrderItems, "id"), vec![100, 102]);
    assert_eq!(ids(&run, Entity::Events, "id"), vec![1, 2, 3]);

    let users = run.table(Entity::Users).unwrap();
    assert_eq!(users.value(&users.rows[0], "email"), &Value::from("ann@example.com"));
    assert_eq!(users.value(&users.rows[1], "city"), &Value::from("Unknown"));
    assert_eq!(users.value(&users.rows[0], "traffic_source"), &Value::from("Search"));

    let centers = run.table(Entity::DistributionCenters).unwrap();
    assert_eq!(centers.value(&centers.rows[1], "name"), &Value::from("Chicago IL"));

    let orders = run.table(Entity::Orders).unwrap();
    assert_eq!(orders.value(&orders.rows[1], "status"), &Value::from("delivered"));

    let products = run.table(Entity::Products).unwrap();
    assert_eq!(products.value(&products.rows[1], "brand"), &Value::from("Generic"));
    assert_eq!(products.value(&products.rows[1], "category"), &Value::from("Uncategorized"));

    let summary = &run.summary;
    assert_eq!(summary.total_original_rows, 24);
    assert_eq!(summary.total_clean_rows, 17);
    assert_eq!(summary.business_rule_removed, 1);
    assert_eq!(summary.error_removed, 6);
    assert_eq!(summary.quality_score, 0.75);
    assert!(run.context.warnings().is_empty());
}

#[tokio::test]
async fn test_cleaned_rows_hold_the_invariants() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let run = pipeline.prepare(Arc::new(store())).await.unwrap();

    assert!(ids(&run, Entity::Users, "age").iter().all(|age| *age >= 18));

    let orders = run.table(Entity::Orders).unwrap();
    for row in &orders.rows {
        let created = orders.value(row, "created_at").as_timestamp().unwrap();
        let shipped = orders.value(row, "shipped_at").as_timestamp();
        let delivered = orders.value(row, "delivered_at").as_timestamp();
        assert!(shipped.is_none_or(|s| s >= created));
        if let (Some(s), Some(d)) = (shipped, delivered) {
            assert!(d >= s);
        }
    }

    for (entity, key) in [
        (Entity::Users, "id"),
        (Entity::Orders, "order_id"),
        (Entity::OrderItems, "id"),
        (Entity::Events, "id"),
    ] {
        let mut keys = ids(&run, entity, key);
        let count = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), count, "duplicate primary key in {}", entity);
    }

    let order_ids = ids(&run, Entity::Orders, "order_id");
    let user_ids = ids(&run, Entity::Users, "id");
    let product_ids = ids(&run, Entity::Products, "id");
    let items = run.table(Entity::OrderItems).unwrap();
    for row in &items.rows {
        let order = items.value(row, "order_id").as_int().unwrap();
        let user = items.value(row, "user_id").as_int().unwrap();
        let product = items.value(row, "product_id").as_int().unwrap();
        assert!(order_ids.contains(&order));
        assert!(user_ids.contains(&user));
        assert!(product_ids.contains(&product));
    }
}

#[tokio::test]
async fn test_shipped_before_created_is_a_data_error() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let run = pipeline.prepare(Arc::new(store())).await.unwrap();

    let report = run.context.cleaning_report(Entity::Orders).unwrap();
    assert_eq!(report.removed(RemovalKind::DataError), 1);
    assert_eq!(report.removed(RemovalKind::BusinessRule), 0);
    assert_eq!(
        report.removed_by_reason.get("shipped_at_before_created_at"),
        Some(&1)
    );
}

#[tokio::test]
async fn test_set_null_keeps_the_child_row() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let run = pipeline.prepare(Arc::new(store())).await.unwrap();

    assert_eq!(
        ints(&run, Entity::InventoryItems, "distribution_center_id"),
        vec![Some(1), None, Some(2)]
    );
    // The minor's event survives anonymously.
    assert_eq!(
        ints(&run, Entity::Events, "user_id"),
        vec![Some(1), None, None]
    );

    let integrity = run.context.integrity().unwrap();
    assert_eq!(integrity.nulled_in(Entity::InventoryItems), 1);
    assert_eq!(integrity.nulled_in(Entity::Events), 1);
    assert_eq!(integrity.removed_from(Entity::OrderItems), 1);
    assert!(integrity.violations.is_empty());

    let quality = run.summary.table(Entity::InventoryItems).unwrap();
    assert_eq!(quality.rows_out, 3);
    assert_eq!(quality.nulled_references, 1);
}

#[tokio::test]
async fn test_restrict_violation_halts_before_load() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let mut sink = MemorySink::new();

    let result = pipeline
        .run(Arc::new(store_with_dangling_product()), &mut sink)
        .await;

    match result {
        Err(PipelineError::IntegrityViolation { count, first }) => {
            assert_eq!(count, 1);
            assert_eq!(first, "order_items row 104: product_id = 2 has no matching products");
        }
        other => panic!("expected an integrity violation, got {:?}", other.map(|_| ())),
    }
    assert!(sink.loaded.is_empty());
}

#[tokio::test]
async fn test_quarantine_drops_dangling_rows_and_loads() {
    let config = PipelineConfig::new().with_restrict_mode(RestrictMode::Quarantine);
    let pipeline = Pipeline::new(registry(), config).unwrap();
    let mut sink = MemorySink::new();

    let run = pipeline
        .run(Arc::new(store_with_dangling_product()), &mut sink)
        .await
        .unwrap();

    assert_eq!(ids(&run, Entity::OrderItems, "id"), vec![100]);
    assert_eq!(run.summary.integrity_violations, 1);
    assert_eq!(run.summary.table(Entity::OrderItems).unwrap().integrity_removed, 1);
    assert_eq!(sink.loaded.len(), 7);
}

#[tokio::test]
async fn test_sink_failure_stops_later_loads() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let mut sink = MemorySink::failing_on(Entity::Orders);

    let result = pipeline.run(Arc::new(store()), &mut sink).await;

    assert!(matches!(
        result,
        Err(PipelineError::Sink {
            entity: Entity::Orders,
            ..
        })
    ));
    assert_eq!(
        sink.entities(),
        vec![
            Entity::DistributionCenters,
            Entity::Users,
            Entity::Products,
            Entity::InventoryItems,
        ]
    );
}

#[tokio::test]
async fn test_missing_extract_fails_the_run() {
    let full = store();
    let mut source = MemorySource::new();
    for entity in Entity::ALL.into_iter().filter(|e| *e != Entity::Events) {
        source.insert(entity, full.extract(entity).unwrap());
    }

    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let result = pipeline.prepare(Arc::new(source)).await;

    assert!(matches!(
        result,
        Err(PipelineError::Source(SourceError::Missing {
            entity: Entity::Events,
            ..
        }))
    ));
}

#[tokio::test]
async fn test_quality_targets_only_fail_in_strict_mode() {
    let mut config = PipelineConfig::new();
    config.quality.min_quality_score = Some(0.9);

    let pipeline = Pipeline::new(registry(), config.clone()).unwrap();
    let run = pipeline.prepare(Arc::new(store())).await.unwrap();
    assert_eq!(run.context.warnings().len(), 1);
    assert!(run.ensure_loadable().is_ok());

    let pipeline = Pipeline::new(registry(), config.with_strict(true)).unwrap();
    let run = pipeline.prepare(Arc::new(store())).await.unwrap();
    assert!(matches!(
        run.ensure_loadable(),
        Err(PipelineError::QualityTargetMissed(_))
    ));
}

#[tokio::test]
async fn test_reruns_are_identical() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();

    let first = pipeline.prepare(Arc::new(store())).await.unwrap();
    let second = pipeline.prepare(Arc::new(store())).await.unwrap();

    assert_eq!(first.tables, second.tables);
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.context.integrity(), second.context.integrity());
    assert_eq!(
        first.context.cleaning_reports().collect::<Vec<_>>(),
        second.context.cleaning_reports().collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_unreadable_event_timestamp_is_a_data_error() {
    let pipeline = Pipeline::new(registry(), PipelineConfig::new()).unwrap();
    let run = pipeline.prepare(Arc::new(store())).await.unwrap();

    let report = run.context.cleaning_report(Entity::Events).unwrap();
    assert_eq!(report.removed(RemovalKind::DataError), 1);
    assert_eq!(report.removed_by_reason.get("invalid_created_at"), Some(&1));
    assert!(!ids(&run, Entity::Events, "id").contains(&4));
}

#[test]
fn test_duplicate_of_a_removed_user_is_still_a_duplicate() {
    let raw = RawTable::from_strs(
        &["id", "email", "age", "city", "created_at"],
        &[
            &["1", "kid@example.com", "12", "Rome", "2023-06-01 12:00:00"],
            &["1", "adult@example.com", "40", "Rome", "2023-06-01 12:00:00"],
            &["2", "kid@example.com", "35", "Oslo", "2023-06-01 12:00:00"],
        ],
    );

    let registry = registry();
    let schema = registry.describe(Entity::Users).unwrap();
    let input = InputConfig::default();
    let mut cleaner = TableCleaner::new(schema, &input, &RuleConfig::default()).unwrap();
    let (table, report) = cleaner.clean(&raw);

    assert!(table.is_empty());
    assert_eq!(report.removed(RemovalKind::BusinessRule), 1);
    assert_eq!(report.removed(RemovalKind::DuplicateKey), 2);
    assert_eq!(report.removed_by_reason.get("duplicate_id"), Some(&1));
    assert_eq!(report.removed_by_reason.get("duplicate_email"), Some(&1));
}

#[test]
fn test_hundred_thousand_users_with_minors() {
    const TOTAL: usize = 100_000;
    const MINORS: usize = 26_224;

    let headers = ["id", "email", "age", "city", "created_at"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = (0..TOTAL)
        .map(|i| {
            // Spread the minors evenly over the batch.
            let minor = (i * MINORS) / TOTAL != ((i + 1) * MINORS) / TOTAL;
            let age = if minor { 13 + i % 5 } else { 18 + i % 60 };
            vec![
                Some((i + 1).to_string()),
                Some(format!("user{}@example.com", i)),
                Some(age.to_string()),
                Some("Rome".to_string()),
                Some("2023-06-01 12:00:00".to_string()),
            ]
        })
        .collect();
    let raw = RawTable::new(headers, rows);

    let registry = registry();
    let schema = registry.describe(Entity::Users).unwrap();
    let input = InputConfig::default();
    let mut cleaner = TableCleaner::new(schema, &input, &RuleConfig::default()).unwrap();
    let (table, report) = cleaner.clean(&raw);

    assert_eq!(table.len(), 73_776);
    assert_eq!(report.cleaned_count, 73_776);
    assert_eq!(report.removed(RemovalKind::BusinessRule), MINORS);
    assert_eq!(report.removed(RemovalKind::DataError), 0);
    assert_eq!(report.removed(RemovalKind::DuplicateKey), 0);
    assert!(table.column_values("age").all(|age| age.as_int().unwrap() >= 18));
}
