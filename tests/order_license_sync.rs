//! End-to-end order/license synchronization on the in-memory adapters.
//!
//! Each test wires a full `LicensingEngine` and drives it the way the order
//! workflow would: by dispatching order events.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::sync::{Arc, Mutex};

use commerce_license::adapters::{
    InMemoryEventBus, InMemoryLicenseRepository, InMemoryNoticeSink, InMemoryOfferingCatalog,
    InMemoryOrderRepository, InMemoryUserAccounts,
};
use commerce_license::application::{LicensingEngine, LicensingPorts, OrderSyncCoordinator};
use commerce_license::config::AppConfig;
use commerce_license::domain::foundation::{
    Clock, CommandMetadata, FixedClock, LicenseId, OfferingId, Timestamp, UserId,
};
use commerce_license::domain::licensing::{
    ExpirationPolicyRef, License, LicenseError, LicenseFields, LicenseState, LicenseTypeRegistry,
    PeriodUnit, RecurringPeriod, RoleLicenseType, SideEffect, ROLE_FIELD,
};
use commerce_license::domain::ordering::{Offering, Order, OrderEvent, OrderEventKind};
use commerce_license::ports::{
    LicenseRepository, OrderEventSubscriber, OrderRepository, UserAccounts,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct World {
    engine: LicensingEngine,
    clock: Arc<FixedClock>,
    users: Arc<InMemoryUserAccounts>,
    licenses: Arc<InMemoryLicenseRepository>,
    orders: Arc<InMemoryOrderRepository>,
    catalog: Arc<InMemoryOfferingCatalog>,
    notices: Arc<InMemoryNoticeSink>,
    bus: Arc<InMemoryEventBus>,
}

fn at(rfc3339: &str) -> Timestamp {
    Timestamp::from_zoned(&DateTime::parse_from_rfc3339(rfc3339).unwrap())
}

fn world() -> World {
    let mut config = AppConfig::default();
    config
        .licensing
        .recurring_periods
        .insert("monthly".to_string(), RecurringPeriod::new(PeriodUnit::Month, 1));
    world_with(config)
}

fn world_with(config: AppConfig) -> World {
    let clock = Arc::new(FixedClock::at(at("2026-03-01T02:00:00Z")));
    let users = Arc::new(InMemoryUserAccounts::new());
    let licenses = Arc::new(InMemoryLicenseRepository::new());
    let orders = Arc::new(InMemoryOrderRepository::new());
    let catalog = Arc::new(InMemoryOfferingCatalog::new());
    let notices = Arc::new(InMemoryNoticeSink::new());
    let bus = Arc::new(InMemoryEventBus::new());

    let registry = LicenseTypeRegistry::new()
        .with(Arc::new(RoleLicenseType::new(users.clone())))
        .unwrap();
    let ports = LicensingPorts {
        licenses: licenses.clone(),
        orders: orders.clone(),
        catalog: catalog.clone(),
        users: users.clone(),
        notices: notices.clone(),
        publisher: bus.clone(),
        clock: clock.clone(),
    };

    World {
        engine: LicensingEngine::build(&config, ports, registry).unwrap(),
        clock,
        users,
        licenses,
        orders,
        catalog,
        notices,
        bus,
    }
}

fn editor_offering(activate_on_place: bool, expiration: &str) -> Offering {
    Offering::licensable(
        OfferingId::new(),
        "Editor access",
        RoleLicenseType::ID,
        LicenseFields::new().with(ROLE_FIELD, "editor"),
        ExpirationPolicyRef::new(expiration),
    )
    .with_activate_on_place(activate_on_place)
}

impl World {
    async fn cart_with(&self, offering: &Offering) -> Order {
        self.catalog.insert(offering.clone()).await;
        let mut order = Order::new(UserId::new("alice").unwrap(), "draft");
        let event = order.add_item(offering.id, 1);
        self.orders.save(&order).await.unwrap();
        self.engine.dispatcher.dispatch(&event).await.unwrap();
        order
    }

    async fn move_order(&self, order: &mut Order, state: &str) -> Result<(), LicenseError> {
        let event = order.transition_to(state);
        self.orders.save(&self.stored(order).await).await.unwrap();
        self.engine.dispatcher.dispatch(&event).await
    }

    async fn stored(&self, order: &Order) -> Order {
        let mut stored = self.orders.find_by_id(&order.id).await.unwrap().unwrap();
        stored.state = order.state.clone();
        stored
    }

    async fn license_on_line(&self, order: &Order) -> Option<License> {
        let stored = self.orders.find_by_id(&order.id).await.unwrap().unwrap();
        let id = stored.lines.first()?.license?;
        self.licenses.find_by_id(&id).await.unwrap()
    }

    fn grants(&self) -> usize {
        self.bus.events_of_type("license.granted.v1").len()
    }

    fn revokes(&self) -> usize {
        self.bus.events_of_type("license.revoked.v1").len()
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn simple_purchase_activates_on_fulfillment() {
    let w = world();
    let offering = editor_offering(false, "unlimited");
    let mut order = w.cart_with(&offering).await;

    w.move_order(&mut order, "placed").await.unwrap();
    let created = w.license_on_line(&order).await.unwrap();
    assert_eq!(created.state(), LicenseState::New);
    assert_eq!(w.grants(), 0);

    w.clock.advance_secs(3_600);
    let fulfilled_at = w.clock.now();
    w.move_order(&mut order, "fulfilled").await.unwrap();

    let license = w.license_on_line(&order).await.unwrap();
    assert_eq!(license.id(), created.id());
    assert_eq!(license.state(), LicenseState::Active);
    assert_eq!(license.granted(), Some(fulfilled_at));
    assert_eq!(license.expires(), None);
    assert_eq!(w.grants(), 1);
    assert_eq!(w.users.roles_of(&order.customer), vec!["editor".to_string()]);
}

#[tokio::test]
async fn activate_on_place_does_not_wait_for_fulfillment() {
    let w = world();
    let offering = editor_offering(true, "unlimited");
    let mut order = w.cart_with(&offering).await;

    w.move_order(&mut order, "placed").await.unwrap();

    let license = w.license_on_line(&order).await.unwrap();
    assert_eq!(license.state(), LicenseState::Active);
    assert_eq!(w.grants(), 1);
}

#[tokio::test]
async fn cancellation_after_activation_revokes_once() {
    let w = world();
    let offering = editor_offering(true, "unlimited");
    let mut order = w.cart_with(&offering).await;
    w.move_order(&mut order, "placed").await.unwrap();

    w.engine
        .dispatcher
        .dispatch(&OrderEvent::Canceled { order: order.id })
        .await
        .unwrap();
    w.move_order(&mut order, "canceled").await.unwrap();

    let license = w.license_on_line(&order).await.unwrap();
    assert_eq!(license.state(), LicenseState::Canceled);
    assert_eq!(w.revokes(), 1);
    assert!(w.users.roles_of(&order.customer).is_empty());
}

#[tokio::test]
async fn cart_guard_keeps_a_single_unit() {
    let w = world();
    let offering = editor_offering(false, "unlimited");
    let mut order = w.cart_with(&offering).await;

    let mut stored = w.stored(&order).await;
    let event = stored.add_item(offering.id, 1);
    w.orders.save(&stored).await.unwrap();
    w.engine.dispatcher.dispatch(&event).await.unwrap();

    order = w.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.lines.len(), 1);
    assert_eq!(order.lines[0].quantity, 1);
    assert_eq!(w.notices.notices().await.len(), 1);
}

#[tokio::test]
async fn existing_role_blocks_the_purchase() {
    let w = world();
    let customer = UserId::new("alice").unwrap();
    w.users.grant_role(&customer, "editor").await.unwrap();

    let order = w.cart_with(&editor_offering(false, "unlimited")).await;

    let stored = w.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert!(stored.lines.is_empty());
    let notices = w.notices.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].message, "You already have the editor role.");
}

#[tokio::test]
async fn redelivered_notifications_are_idempotent() {
    let w = world();
    let offering = editor_offering(true, "monthly");
    let mut order = w.cart_with(&offering).await;
    w.move_order(&mut order, "placed").await.unwrap();
    let first = w.license_on_line(&order).await.unwrap();

    w.clock.advance_secs(86_400);
    let replay = OrderEvent::Transitioned {
        order: order.id,
        from_state: "draft".to_string(),
        to_state: "placed".to_string(),
    };
    w.engine.dispatcher.dispatch(&replay).await.unwrap();
    w.engine.dispatcher.dispatch(&replay).await.unwrap();
    w.move_order(&mut order, "fulfilled").await.unwrap();

    let again = w.license_on_line(&order).await.unwrap();
    assert_eq!(again.granted(), first.granted());
    assert_eq!(again.expires(), first.expires());
    assert_eq!(w.grants(), 1);
    assert_eq!(w.licenses.all().await.len(), 1);
}

#[tokio::test]
async fn expiry_follows_the_owner_timezone() {
    let w = world();
    let customer = UserId::new("alice").unwrap();
    w.users
        .set_timezone(&customer, FixedOffset::west_opt(5 * 3600).unwrap());
    let offering = editor_offering(true, "monthly");
    let mut order = w.cart_with(&offering).await;

    // 2026-03-01T02:00Z is still February 28th in UTC-5.
    w.move_order(&mut order, "placed").await.unwrap();

    let license = w.license_on_line(&order).await.unwrap();
    assert_eq!(license.expires(), Some(at("2026-03-29T02:00:00Z")));
}

#[tokio::test]
async fn deleting_an_active_license_revokes_it() {
    let w = world();
    let offering = editor_offering(true, "unlimited");
    let mut order = w.cart_with(&offering).await;
    w.move_order(&mut order, "placed").await.unwrap();
    let license = w.license_on_line(&order).await.unwrap();

    let effect = w
        .engine
        .admin
        .delete(license.id(), CommandMetadata::for_admin(UserId::new("admin").unwrap()))
        .await
        .unwrap();

    assert_eq!(effect, SideEffect::Revoke);
    assert!(w.users.roles_of(&order.customer).is_empty());
    assert!(w.licenses.find_by_id(&license.id()).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_grant_surfaces_and_is_recoverable() {
    let w = world();
    let offering = editor_offering(false, "unlimited");
    let mut order = w.cart_with(&offering).await;
    w.move_order(&mut order, "placed").await.unwrap();

    w.users.fail_role_changes(true);
    let err = w.move_order(&mut order, "fulfilled").await.unwrap_err();
    assert!(matches!(err, LicenseError::StrategyExecution { .. }));

    let pending = w.license_on_line(&order).await.unwrap();
    assert_eq!(pending.state(), LicenseState::Pending);
    assert_eq!(pending.granted(), None);

    w.users.fail_role_changes(false);
    w.engine
        .dispatcher
        .dispatch(&OrderEvent::Transitioned {
            order: order.id,
            from_state: "placed".to_string(),
            to_state: "fulfilled".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(w.license_on_line(&order).await.unwrap().state(), LicenseState::Active);
    assert_eq!(w.grants(), 1);
}

#[tokio::test]
async fn failed_license_write_propagates_to_the_workflow() {
    let w = world();
    let offering = editor_offering(false, "unlimited");
    let mut order = w.cart_with(&offering).await;
    w.licenses.fail_writes(true);

    let err = w.move_order(&mut order, "placed").await.unwrap_err();

    assert!(matches!(err, LicenseError::Persistence(_)));
    assert!(w.license_on_line(&order).await.is_none());
}

// =============================================================================
// Subscriber ordering
// =============================================================================

/// Stands in for a subscription-creation subscriber that needs the license.
struct LicenseReader {
    orders: Arc<InMemoryOrderRepository>,
    seen: Mutex<Vec<Option<LicenseId>>>,
}

#[async_trait]
impl OrderEventSubscriber for LicenseReader {
    fn name(&self) -> &'static str {
        "subscription_creation"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn interests(&self) -> &'static [OrderEventKind] {
        &[OrderEventKind::Transitioned]
    }

    fn depends_on(&self) -> &'static [&'static str] {
        &[OrderSyncCoordinator::NAME]
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), LicenseError> {
        let order = self.orders.find_by_id(&event.order_id()).await?;
        let license = order.and_then(|o| o.lines.first().and_then(|l| l.license));
        self.seen.lock().unwrap().push(license);
        Ok(())
    }
}

#[tokio::test]
async fn dependent_subscriber_sees_the_license() {
    let mut w = world();
    let reader = Arc::new(LicenseReader {
        orders: w.orders.clone(),
        seen: Mutex::new(Vec::new()),
    });
    w.engine.dispatcher.register(reader.clone()).unwrap();
    let offering = editor_offering(false, "unlimited");
    let mut order = w.cart_with(&offering).await;

    w.move_order(&mut order, "placed").await.unwrap();

    let seen = reader.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].is_some());
}

#[test]
fn subscriber_ordered_before_its_producer_is_rejected() {
    struct Early;

    #[async_trait]
    impl OrderEventSubscriber for Early {
        fn name(&self) -> &'static str {
            "too_early"
        }
        fn priority(&self) -> i32 {
            -500
        }
        fn interests(&self) -> &'static [OrderEventKind] {
            &[OrderEventKind::Transitioned]
        }
        fn depends_on(&self) -> &'static [&'static str] {
            &[OrderSyncCoordinator::NAME]
        }
        async fn handle(&self, _event: &OrderEvent) -> Result<(), LicenseError> {
            Ok(())
        }
    }

    let mut w = world();
    assert!(w.engine.dispatcher.register(Arc::new(Early)).is_err());
}
