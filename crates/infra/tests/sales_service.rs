//! Integration tests for the sale pipeline.
//!
//! Tests: SalesService → SaleRepository → EventBus
//!
//! Verifies:
//! - Use cases enforce their caller-level policies
//! - Writes advance the stored version and stale copies are rejected
//! - Events are published after the write, stamped with the new version

use std::sync::Arc;
use std::sync::mpsc;

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use salesdesk_core::{AggregateRoot, Currency, Money, SaleId};
use salesdesk_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use salesdesk_infra::{
    CreateSale, ErrorKind, InMemorySaleRepository, NewSaleItem, RepositoryError,
    SALE_AGGREGATE_TYPE, SaleRepository, SalesConfig, SalesService, ServiceError,
};
use salesdesk_sales::testing::{SaleBuilder, sample_branch, sample_customer, sample_product, usd};
use salesdesk_sales::{ProductRef, SaleChange, SaleEvent, SaleQueryParams, SaleStatus};

type Envelope = EventEnvelope<SaleEvent>;
type Service = SalesService<Arc<InMemorySaleRepository>, Arc<InMemoryEventBus<Envelope>>>;

fn setup(config: SalesConfig) -> (Service, Arc<InMemorySaleRepository>, Subscription<Envelope>) {
    salesdesk_observability::init_for_tests();
    let repository = Arc::new(InMemorySaleRepository::new());
    let bus: Arc<InMemoryEventBus<Envelope>> = Arc::new(InMemoryEventBus::new());
    let subscription = bus.subscribe();
    let service = SalesService::new(repository.clone(), bus, config);
    (service, repository, subscription)
}

fn line(product: &ProductRef, quantity: u32, price: Decimal) -> NewSaleItem {
    NewSaleItem {
        product: product.clone(),
        quantity,
        unit_price: usd(price),
    }
}

fn create_command(number: &str, items: Vec<NewSaleItem>) -> CreateSale {
    CreateSale {
        sale_number: number.to_string(),
        sale_date: Utc::now(),
        customer: sample_customer("Ana Souza"),
        branch: sample_branch("Downtown"),
        currency: Currency::usd(),
        items,
    }
}

fn event_types(envelopes: &[Envelope]) -> Vec<&'static str> {
    use salesdesk_events::Event;
    envelopes.iter().map(|e| e.payload().event_type()).collect()
}

#[test]
fn create_sale_persists_and_publishes() {
    let (service, repository, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let wine = sample_product("Wine");

    let sale = service
        .create_sale(create_command(
            "S-0001",
            vec![line(&beer, 4, dec!(10.00)), line(&wine, 10, dec!(5.00))],
        ))
        .unwrap();

    assert_eq!(sale.version(), 1);
    assert_eq!(sale.total_amount().amount(), dec!(76.00));
    assert!(sale.pending_events().is_empty());
    assert_eq!(repository.get_by_id(sale.id_typed()).unwrap().unwrap(), sale);

    let published = subscription.drain();
    assert_eq!(
        event_types(&published),
        vec!["sales.sale.created", "sales.sale.modified", "sales.sale.modified"]
    );
    for envelope in &published {
        assert_eq!(envelope.aggregate_id(), *sale.id_typed().as_uuid());
        assert_eq!(envelope.aggregate_type(), SALE_AGGREGATE_TYPE);
        assert_eq!(envelope.aggregate_version(), 1);
    }
}

#[test]
fn published_envelopes_serialize_to_json() {
    let (service, _, subscription) = setup(SalesConfig::default());
    let sale = service
        .create_sale(create_command("S-0001", vec![line(&sample_product("Beer"), 2, dec!(3.50))]))
        .unwrap();
    service.cancel_sale(sale.id_typed()).unwrap();

    let published = subscription.drain();
    let cancelled = published.last().unwrap();
    let json = serde_json::to_value(cancelled).unwrap();

    let sale_id = sale.id_typed().to_string();
    assert_eq!(json["aggregate_id"], sale_id.as_str());
    assert_eq!(json["aggregate_type"], SALE_AGGREGATE_TYPE);
    assert_eq!(json["aggregate_version"], 2);
    assert_eq!(json["event_id"], cancelled.event_id().to_string().as_str());
    assert_eq!(json["payload"]["SaleCancelled"]["sale_id"], sale_id.as_str());

    let created = serde_json::to_value(&published[0]).unwrap();
    assert_eq!(created["aggregate_version"], 1);
    assert_eq!(created["payload"]["SaleCreated"]["sale_number"], "S-0001");
}

#[test]
fn create_sale_merges_repeated_products() {
    let (service, _, _) = setup(SalesConfig::default());
    let beer = sample_product("Beer");

    let sale = service
        .create_sale(create_command(
            "S-0001",
            vec![line(&beer, 3, dec!(10.00)), line(&beer, 2, dec!(10.00))],
        ))
        .unwrap();

    assert_eq!(sale.items().len(), 1);
    assert_eq!(sale.items()[0].quantity(), 5);
    assert_eq!(sale.total_amount().amount(), dec!(45.00));
}

#[test]
fn create_sale_requires_items_and_a_unique_number() {
    let (service, repository, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");

    let err = service.create_sale(create_command("S-0001", vec![])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    service
        .create_sale(create_command("S-0001", vec![line(&beer, 1, dec!(1))]))
        .unwrap();
    let err = service
        .create_sale(create_command(" S-0001 ", vec![line(&beer, 1, dec!(1))]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(repository.len().unwrap(), 1);
    assert_eq!(subscription.drain().len(), 2);
}

#[test]
fn create_sale_with_an_invalid_line_writes_nothing() {
    let (service, repository, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");

    let err = service
        .create_sale(create_command("S-0001", vec![line(&beer, 21, dec!(1))]))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(repository.is_empty().unwrap());
    assert!(subscription.drain().is_empty());
}

#[test]
fn lookups_report_missing_sales() {
    let (service, _, _) = setup(SalesConfig::default());

    assert_eq!(service.get_sale(SaleId::new()).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(
        service.get_sale_by_number("S-404").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn line_changes_advance_the_version() {
    let (service, _, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let sale = service
        .create_sale(create_command("S-0001", vec![line(&beer, 1, dec!(10.00))]))
        .unwrap();
    subscription.drain();
    let item_id = sale.items()[0].id();

    let sale = service.update_item_quantity(sale.id_typed(), item_id, 10).unwrap();
    assert_eq!(sale.version(), 2);
    assert_eq!(sale.total_amount().amount(), dec!(80.00));

    let sale = service
        .update_item_price(sale.id_typed(), item_id, usd(dec!(20.00)))
        .unwrap();
    assert_eq!(sale.version(), 3);
    assert_eq!(sale.total_amount().amount(), dec!(160.00));

    let published = subscription.drain();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].aggregate_version(), 2);
    assert!(matches!(
        published[1].payload(),
        SaleEvent::SaleModified(m) if matches!(m.change, SaleChange::PriceChanged { .. })
    ));
}

#[test]
fn rejected_change_leaves_stored_sale_untouched() {
    let (service, repository, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let sale = service
        .create_sale(create_command("S-0001", vec![line(&beer, 18, dec!(1.00))]))
        .unwrap();
    subscription.drain();

    let err = service.add_item(sale.id_typed(), line(&beer, 5, dec!(1.00))).unwrap_err();
    assert!(matches!(err, ServiceError::Domain(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let foreign = NewSaleItem {
        product: sample_product("Cheese"),
        quantity: 1,
        unit_price: Money::new(dec!(1), Currency::new("EUR").unwrap()).unwrap(),
    };
    assert_eq!(
        service.add_item(sale.id_typed(), foreign).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );

    assert_eq!(repository.get_by_id(sale.id_typed()).unwrap().unwrap(), sale);
    assert!(subscription.drain().is_empty());
}

#[test]
fn last_item_cannot_be_removed() {
    let (service, _, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let wine = sample_product("Wine");
    let sale = service
        .create_sale(create_command(
            "S-0001",
            vec![line(&beer, 1, dec!(3.00)), line(&wine, 1, dec!(7.00))],
        ))
        .unwrap();
    subscription.drain();
    let beer_line = sale.items()[0].id();
    let wine_line = sale.items()[1].id();

    let sale = service.remove_item(sale.id_typed(), beer_line).unwrap();
    assert_eq!(sale.items().len(), 1);
    assert_eq!(sale.total_amount().amount(), dec!(7.00));

    let err = service.remove_item(sale.id_typed(), wine_line).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .remove_item(sale.id_typed(), salesdesk_core::SaleItemId::new())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert_eq!(event_types(&subscription.drain()), vec!["sales.sale.item_cancelled"]);
}

#[test]
fn cancel_and_reactivate_round_trip() {
    let (service, _, subscription) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let sale = service
        .create_sale(create_command("S-0001", vec![line(&beer, 2, dec!(4.00))]))
        .unwrap();
    subscription.drain();

    let cancelled = service.cancel_sale(sale.id_typed()).unwrap();
    assert_eq!(cancelled.status(), SaleStatus::Cancelled);
    assert!(cancelled.cancelled_at().is_some());

    let err = service
        .update_item_quantity(sale.id_typed(), sale.items()[0].id(), 3)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(service.cancel_sale(sale.id_typed()).unwrap_err().kind(), ErrorKind::InvalidState);

    let active = service.reactivate_sale(sale.id_typed()).unwrap();
    assert_eq!(active.status(), SaleStatus::Active);
    assert!(active.cancelled_at().is_none());
    assert_eq!(active.version(), 3);
    assert_eq!(
        service.reactivate_sale(sale.id_typed()).unwrap_err().kind(),
        ErrorKind::InvalidState
    );

    assert_eq!(
        event_types(&subscription.drain()),
        vec!["sales.sale.cancelled", "sales.sale.reactivated"]
    );
}

#[test]
fn sales_outside_the_window_cannot_be_cancelled() {
    let (service, repository, _) = setup(SalesConfig {
        cancellation_window_days: 7,
        ..SalesConfig::default()
    });
    let old = SaleBuilder::new()
        .sale_number("S-OLD")
        .sale_date(Utc::now() - TimeDelta::days(8))
        .item(sample_product("Beer"), 1, usd(dec!(1)))
        .build()
        .unwrap();
    let old = repository.create(old).unwrap();

    let err = service.cancel_sale(old.id_typed()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(
        repository.get_by_id(old.id_typed()).unwrap().unwrap().status(),
        SaleStatus::Active
    );
}

#[test]
fn stale_writes_are_rejected() {
    let (service, repository, _) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let sale = service
        .create_sale(create_command("S-0001", vec![line(&beer, 1, dec!(1))]))
        .unwrap();

    let mut stale = service.get_sale(sale.id_typed()).unwrap();
    service.cancel_sale(sale.id_typed()).unwrap();

    let item_id = stale.items()[0].id();
    stale.update_item_quantity(item_id, 2).unwrap();
    assert!(matches!(repository.update(stale), Err(RepositoryError::Conflict(_))));
}

#[test]
fn list_sales_uses_the_configured_page_size() {
    let (service, _, _) = setup(SalesConfig {
        default_page_size: 2,
        ..SalesConfig::default()
    });
    let beer = sample_product("Beer");
    for n in 1..=5 {
        service
            .create_sale(create_command(&format!("S-000{n}"), vec![line(&beer, n, dec!(1))]))
            .unwrap();
    }

    let page = service.list_sales(SaleQueryParams::default()).unwrap();
    assert_eq!(page.page_size(), 2);
    assert_eq!(page.items().len(), 2);
    assert_eq!(page.total_count(), 5);
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next());

    let params = SaleQueryParams {
        order_by: Some("totalamount".to_string()),
        order_direction: Some("ASC".to_string()),
        page_size: Some(5),
        ..SaleQueryParams::default()
    };
    let page = service.list_sales(params).unwrap();
    let totals: Vec<Decimal> = page.items().iter().map(|s| s.total_amount().amount()).collect();
    assert_eq!(totals, vec![dec!(1), dec!(2), dec!(3), dec!(3.6), dec!(4.5)]);

    let bad = SaleQueryParams {
        page: Some(0),
        ..SaleQueryParams::default()
    };
    assert_eq!(service.list_sales(bad).unwrap_err().kind(), ErrorKind::Validation);
}

#[test]
fn delete_sale_removes_it() {
    let (service, repository, _) = setup(SalesConfig::default());
    let beer = sample_product("Beer");
    let sale = service
        .create_sale(create_command("S-0001", vec![line(&beer, 1, dec!(1))]))
        .unwrap();

    service.delete_sale(sale.id_typed()).unwrap();
    assert!(repository.is_empty().unwrap());
    assert_eq!(service.delete_sale(sale.id_typed()).unwrap_err().kind(), ErrorKind::NotFound);
}

/// Bus whose broker is always unavailable.
struct UnavailableBus;

impl EventBus<Envelope> for UnavailableBus {
    type Error = &'static str;

    fn publish(&self, _message: Envelope) -> Result<(), Self::Error> {
        Err("broker unavailable")
    }

    fn subscribe(&self) -> Subscription<Envelope> {
        let (_tx, rx) = mpsc::channel();
        Subscription::new(rx)
    }
}

#[test]
fn publish_failure_is_reported_after_the_write() {
    let repository = Arc::new(InMemorySaleRepository::new());
    let service = SalesService::new(repository.clone(), UnavailableBus, SalesConfig::default());
    let beer = sample_product("Beer");

    let err = service
        .create_sale(create_command("S-0001", vec![line(&beer, 1, dec!(1))]))
        .unwrap_err();

    assert!(matches!(err, ServiceError::Publish(_)));
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(repository.get_by_sale_number("S-0001").unwrap().is_some());
}
