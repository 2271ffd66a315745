//! Alert engine
//!
//! Derives stock and delivery-frequency alerts from the ledger, keeps at most
//! one open alert per `(kind, subject)`, and resolves alerts automatically
//! when their condition clears or manually on operator request.
//!
//! Evaluation is an explicit call: the delivery service and the stock ledger
//! invoke [`AlertEngine::evaluate_item_in`] inside their own transaction,
//! restore sweeps the restored ledger, and the backup scheduler runs
//! [`AlertEngine::sweep_at`] on every tick so time-window alerts expire.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, EntityType};
use crate::config::AlertSettings;
use crate::error::{StockroomError, StockroomResult};
use crate::models::{
    Alert, AlertId, AlertKey, AlertKind, AlertSeverity, Item, ItemId, Resolution, StockStatus,
};
use crate::storage::{Dataset, Store};

/// Alert kinds derived from per-item evaluation
const EVALUATED_KINDS: [AlertKind; 4] = [
    AlertKind::CriticalStock,
    AlertKind::LowStock,
    AlertKind::ExcessStock,
    AlertKind::FrequentDelivery,
];

/// Start of every SYSTEM_ERROR message raised by the consistency check
const CONSISTENCY_PREFIX: &str = "Ledger consistency check failed";

/// What an evaluation or raise changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertChanges {
    pub raised: Vec<AlertId>,
    pub upgraded: Vec<AlertId>,
    pub resolved: Vec<AlertId>,
}

impl AlertChanges {
    pub fn is_empty(&self) -> bool {
        self.raised.is_empty() && self.upgraded.is_empty() && self.resolved.is_empty()
    }

    fn merge(&mut self, other: AlertChanges) {
        self.raised.extend(other.raised);
        self.upgraded.extend(other.upgraded);
        self.resolved.extend(other.resolved);
    }
}

/// Active alert counts for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSummary {
    pub total_active: usize,
    pub by_severity: BTreeMap<AlertSeverity, usize>,
    pub by_kind: BTreeMap<AlertKind, usize>,
    /// Active CRITICAL and HIGH alerts
    pub action_required: usize,
}

pub struct AlertEngine<'a> {
    store: &'a Store,
    settings: AlertSettings,
}

impl<'a> AlertEngine<'a> {
    pub fn new(store: &'a Store, settings: &AlertSettings) -> Self {
        Self {
            store,
            settings: settings.clone(),
        }
    }

    /// Re-evaluate every rule for one item inside an open transaction
    pub fn evaluate_item_in(
        &self,
        data: &mut Dataset,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> AlertChanges {
        let mut changes = AlertChanges::default();

        let item = match data.items.get(&item_id) {
            Some(item) if item.active => item.clone(),
            _ => {
                for kind in EVALUATED_KINDS {
                    clear_condition(data, AlertKey::for_item(kind, item_id), now, &mut changes);
                }
                return changes;
            }
        };

        let recent_deliveries = self.recent_delivery_count(data, item_id, now);

        for (kind, message) in self.conditions(&item, recent_deliveries) {
            let key = AlertKey::for_item(kind, item_id);
            match message {
                Some(message) => {
                    if data.suppressed_alerts.contains(&key) {
                        continue;
                    }
                    let outcome =
                        raise_in(data, kind, kind.default_severity(), Some(item_id), message, now);
                    changes.merge(outcome);
                }
                None => clear_condition(data, key, now, &mut changes),
            }
        }

        if !changes.is_empty() {
            debug!(
                item = %item.name,
                raised = changes.raised.len(),
                upgraded = changes.upgraded.len(),
                resolved = changes.resolved.len(),
                "item alerts re-evaluated"
            );
        }

        changes
    }

    /// Re-evaluate every item, close item alerts whose subject is gone, and
    /// raise or clear the ledger consistency SYSTEM_ERROR
    pub fn sweep_in(&self, data: &mut Dataset, now: DateTime<Utc>) -> AlertChanges {
        let mut changes = AlertChanges::default();

        let item_ids: Vec<ItemId> = data.items.keys().copied().collect();
        for item_id in item_ids {
            changes.merge(self.evaluate_item_in(data, item_id, now));
        }

        let orphaned: Vec<AlertKey> = data
            .alerts
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| matches!(a.subject, Some(id) if !data.items.contains_key(&id)))
            .map(Alert::key)
            .collect();
        for key in orphaned {
            clear_condition(data, key, now, &mut changes);
        }

        changes.merge(check_consistency(data, now));
        changes
    }

    /// Full sweep against the live ledger
    pub fn sweep(&self) -> StockroomResult<AlertChanges> {
        self.sweep_at(Utc::now())
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> StockroomResult<AlertChanges> {
        let changes = self.store.transaction(|data| Ok(self.sweep_in(data, now)))?;
        info!(
            raised = changes.raised.len(),
            upgraded = changes.upgraded.len(),
            resolved = changes.resolved.len(),
            "alert sweep complete"
        );
        Ok(changes)
    }

    /// Open an alert, or upgrade the open alert with the same key
    pub fn raise(
        &self,
        kind: AlertKind,
        severity: AlertSeverity,
        subject: Option<ItemId>,
        message: impl Into<String>,
    ) -> StockroomResult<Alert> {
        let message = message.into();
        let now = Utc::now();
        let key = AlertKey::new(kind, subject);

        let (alert, changes) = self.store.transaction(|data| {
            let changes = raise_in(data, kind, severity, subject, message, now);
            let alert = find_open(data, key)
                .cloned()
                .ok_or_else(|| StockroomError::Storage("raised alert missing".into()))?;
            Ok((alert, changes))
        })?;

        if !changes.raised.is_empty() {
            info!(kind = %kind, severity = %alert.severity, "alert raised");
        }
        Ok(alert)
    }

    /// Auto-resolve the open alert for `(kind, subject)`, if any
    pub fn clear(&self, kind: AlertKind, subject: Option<ItemId>) -> StockroomResult<bool> {
        let now = Utc::now();
        let changes = self.store.transaction(|data| {
            let mut changes = AlertChanges::default();
            clear_condition(data, AlertKey::new(kind, subject), now, &mut changes);
            Ok(changes)
        })?;
        if !changes.resolved.is_empty() {
            info!(kind = %kind, "alert cleared");
        }
        Ok(!changes.resolved.is_empty())
    }

    /// Operator acknowledgement. An evaluated condition that still holds
    /// stays quiet until it clears and recurs.
    pub fn resolve(&self, alert_id: AlertId, operator: &str) -> StockroomResult<Alert> {
        let operator = validate_operator(operator)?;
        let now = Utc::now();

        let alert = self.store.transaction(|data| {
            let alert = data
                .alerts
                .iter_mut()
                .find(|a| a.id == alert_id)
                .ok_or_else(|| StockroomError::alert_not_found(alert_id.to_string()))?;

            if !alert.is_active() {
                return Err(StockroomError::Validation(format!(
                    "Alert {} is already resolved",
                    alert_id
                )));
            }

            alert.resolve(Resolution::Manual { operator: operator.clone() }, now);
            let resolved = alert.clone();
            if EVALUATED_KINDS.contains(&resolved.kind) {
                data.suppressed_alerts.insert(resolved.key());
            }
            Ok(resolved)
        })?;

        info!(alert = %alert.id, kind = %alert.kind, operator = %operator, "alert resolved");
        self.store.record_audit(&[resolution_entry(&alert)]);
        Ok(alert)
    }

    /// Resolve every active alert of one kind
    pub fn resolve_kind(&self, kind: AlertKind, operator: &str) -> StockroomResult<Vec<Alert>> {
        let operator = validate_operator(operator)?;
        let now = Utc::now();

        let resolved = self.store.transaction(|data| {
            let mut resolved = Vec::new();
            for alert in data.alerts.iter_mut().filter(|a| a.kind == kind && a.is_active()) {
                alert.resolve(Resolution::Manual { operator: operator.clone() }, now);
                resolved.push(alert.clone());
            }
            if EVALUATED_KINDS.contains(&kind) {
                data.suppressed_alerts
                    .extend(resolved.iter().map(Alert::key));
            }
            Ok(resolved)
        })?;

        info!(kind = %kind, count = resolved.len(), operator = %operator, "alerts resolved");
        let entries: Vec<_> = resolved.iter().map(resolution_entry).collect();
        self.store.record_audit(&entries);
        Ok(resolved)
    }

    /// Unresolved alerts, highest severity first, then oldest first
    pub fn list_active_alerts(&self) -> StockroomResult<Vec<Alert>> {
        self.list_active_filtered(None, None)
    }

    pub fn list_active_filtered(
        &self,
        severity: Option<AlertSeverity>,
        kind: Option<AlertKind>,
    ) -> StockroomResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self.store.read(|data| {
            data.alerts
                .iter()
                .filter(|a| a.is_active())
                .filter(|a| severity.map_or(true, |s| a.severity == s))
                .filter(|a| kind.map_or(true, |k| a.kind == k))
                .cloned()
                .collect()
        })?;

        sort_for_display(&mut alerts);
        Ok(alerts)
    }

    /// Most recently resolved alerts, newest first
    pub fn list_resolved(&self, limit: usize) -> StockroomResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self.store.read(|data| {
            data.alerts
                .iter()
                .filter(|a| !a.is_active())
                .cloned()
                .collect()
        })?;
        alerts.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
        alerts.truncate(limit);
        Ok(alerts)
    }

    pub fn summary(&self) -> StockroomResult<AlertSummary> {
        let active = self.list_active_alerts()?;
        let mut summary = AlertSummary {
            total_active: active.len(),
            ..Default::default()
        };
        for alert in &active {
            *summary.by_severity.entry(alert.severity).or_default() += 1;
            *summary.by_kind.entry(alert.kind).or_default() += 1;
            if alert.severity.requires_action() {
                summary.action_required += 1;
            }
        }
        Ok(summary)
    }

    /// Drop resolved alerts older than the given number of days
    pub fn purge_resolved(&self, older_than_days: u32) -> StockroomResult<usize> {
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let removed = self.store.transaction(|data| {
            let before = data.alerts.len();
            data.alerts
                .retain(|a| a.resolved_at.map_or(true, |resolved| resolved >= cutoff));
            Ok(before - data.alerts.len())
        })?;
        info!(removed, older_than_days, "resolved alerts purged");
        Ok(removed)
    }

    fn recent_delivery_count(&self, data: &Dataset, item_id: ItemId, now: DateTime<Utc>) -> usize {
        let window = Duration::hours(i64::from(self.settings.frequent_delivery_window_hours));
        let cutoff = now - window;
        data.deliveries
            .iter()
            .filter(|d| d.item_id == item_id && d.delivered_at > cutoff && d.delivered_at <= now)
            .count()
    }

    /// Each evaluated kind paired with a message when its condition holds
    fn conditions(
        &self,
        item: &Item,
        recent_deliveries: usize,
    ) -> [(AlertKind, Option<String>); 4] {
        let quantity = item.quantity_current;
        let status = self.settings.stock_status(item);

        let critical =
            (status == StockStatus::Critical).then(|| format!("{} is out of stock", item.name));

        let low = (status == StockStatus::Low).then(|| {
            format!(
                "{} is running low: {} {} left (minimum {})",
                item.name, quantity, item.unit, item.quantity_minimum
            )
        });

        let excess = (status == StockStatus::Excess).then(|| {
            format!(
                "{} is overstocked: {} {} on hand (maximum {})",
                item.name, quantity, item.unit, item.quantity_maximum
            )
        });

        let frequent = (recent_deliveries > self.settings.frequent_delivery_count as usize)
            .then(|| {
                format!(
                    "{} delivered {} times in the last {}h",
                    item.name, recent_deliveries, self.settings.frequent_delivery_window_hours
                )
            });

        [
            (AlertKind::CriticalStock, critical),
            (AlertKind::LowStock, low),
            (AlertKind::ExcessStock, excess),
            (AlertKind::FrequentDelivery, frequent),
        ]
    }
}

/// Open a new alert or upgrade the open one with the same key
pub(crate) fn raise_in(
    data: &mut Dataset,
    kind: AlertKind,
    severity: AlertSeverity,
    subject: Option<ItemId>,
    message: String,
    now: DateTime<Utc>,
) -> AlertChanges {
    let mut changes = AlertChanges::default();
    let key = AlertKey::new(kind, subject);

    if let Some(open) = data
        .alerts
        .iter_mut()
        .find(|a| a.is_active() && a.key() == key)
    {
        if severity > open.severity {
            open.severity = severity;
            open.message = message;
            changes.upgraded.push(open.id);
        }
        return changes;
    }

    let alert = Alert::new(kind, severity, subject, message, now);
    changes.raised.push(alert.id);
    data.alerts.push(alert);
    changes
}

/// Raise SYSTEM_ERROR while the ledger has structural problems, and clear
/// the alert this check raised once they are gone
fn check_consistency(data: &mut Dataset, now: DateTime<Utc>) -> AlertChanges {
    let problems = data.structural_problems();
    let key = AlertKey::new(AlertKind::SystemError, None);

    if problems.is_empty() {
        let mut changes = AlertChanges::default();
        let raised_here = find_open(data, key)
            .map_or(false, |alert| alert.message.starts_with(CONSISTENCY_PREFIX));
        if raised_here {
            clear_condition(data, key, now, &mut changes);
        }
        return changes;
    }

    warn!(problems = problems.len(), "ledger consistency check failed");
    raise_in(
        data,
        AlertKind::SystemError,
        AlertKind::SystemError.default_severity(),
        None,
        format!("{}: {}", CONSISTENCY_PREFIX, problems.join("; ")),
        now,
    )
}

/// The condition behind `key` no longer holds
fn clear_condition(
    data: &mut Dataset,
    key: AlertKey,
    now: DateTime<Utc>,
    changes: &mut AlertChanges,
) {
    data.suppressed_alerts.remove(&key);
    for alert in data
        .alerts
        .iter_mut()
        .filter(|a| a.is_active() && a.key() == key)
    {
        alert.resolve(Resolution::Automatic, now);
        changes.resolved.push(alert.id);
    }
}

fn find_open(data: &Dataset, key: AlertKey) -> Option<&Alert> {
    data.alerts.iter().find(|a| a.is_active() && a.key() == key)
}

fn sort_for_display(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(a.created_at.cmp(&b.created_at))
    });
}

fn validate_operator(operator: &str) -> StockroomResult<String> {
    let operator = operator.trim();
    if operator.is_empty() {
        return Err(StockroomError::Validation(
            "Operator name is required to resolve an alert".into(),
        ));
    }
    Ok(operator.to_string())
}

fn resolution_entry(alert: &Alert) -> AuditEntry {
    let mut before = alert.clone();
    before.resolved_at = None;
    before.resolution = None;
    AuditEntry::update(
        EntityType::Alert,
        alert.id.to_string(),
        Some(alert.kind.to_string()),
        &before,
        alert,
        alert.resolution.as_ref().map(|r| format!("resolved: {}", r)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::StockroomPaths;
    use crate::models::{Delivery, Employee};
    use crate::storage::LockPolicy;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Store) {
        let temp_dir = TempDir::new().unwrap();
        let paths = StockroomPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Store::open(paths, LockPolicy::default()).unwrap();
        (temp_dir, store)
    }

    fn add_item(store: &Store, quantity: u32, minimum: u32, maximum: u32) -> ItemId {
        let item = Item::new("Toner", "Printing", minimum, maximum)
            .with_quantity(quantity)
            .with_unit("cartridge");
        let id = item.id;
        store
            .transaction(|data| {
                data.items.insert(id, item);
                Ok(())
            })
            .unwrap();
        id
    }

    fn set_quantity(store: &Store, id: ItemId, quantity: u32) {
        store
            .transaction(|data| {
                data.items.get_mut(&id).unwrap().quantity_current = quantity;
                Ok(())
            })
            .unwrap();
    }

    fn evaluate(engine: &AlertEngine, store: &Store, id: ItemId) -> AlertChanges {
        store
            .transaction(|data| Ok(engine.evaluate_item_in(data, id, Utc::now())))
            .unwrap()
    }

    fn active_kinds(engine: &AlertEngine) -> Vec<AlertKind> {
        engine
            .list_active_alerts()
            .unwrap()
            .into_iter()
            .map(|a| a.kind)
            .collect()
    }

    #[test]
    fn test_low_stock_raised_once() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 4, 5, 20);

        let first = evaluate(&engine, &store, id);
        let second = evaluate(&engine, &store, id);

        assert_eq!(first.raised.len(), 1);
        assert!(second.is_empty());
        assert_eq!(active_kinds(&engine), vec![AlertKind::LowStock]);
    }

    #[test]
    fn test_critical_supersedes_low() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 2, 5, 20);
        evaluate(&engine, &store, id);

        set_quantity(&store, id, 0);
        let changes = evaluate(&engine, &store, id);

        assert_eq!(changes.raised.len(), 1);
        assert_eq!(changes.resolved.len(), 1);
        assert_eq!(active_kinds(&engine), vec![AlertKind::CriticalStock]);
    }

    #[test]
    fn test_condition_clearing_auto_resolves() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 1, 5, 20);
        evaluate(&engine, &store, id);

        set_quantity(&store, id, 10);
        evaluate(&engine, &store, id);

        assert!(engine.list_active_alerts().unwrap().is_empty());
        let resolved = engine.list_resolved(10).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].resolution, Some(Resolution::Automatic));
    }

    #[test]
    fn test_excess_respects_factor() {
        let (_temp, store) = setup();
        let id = add_item(&store, 23, 5, 20);

        let strict = AlertEngine::new(&store, &AlertSettings::default());
        evaluate(&strict, &store, id);
        assert_eq!(active_kinds(&strict), vec![AlertKind::ExcessStock]);

        let lenient = AlertEngine::new(
            &store,
            &AlertSettings {
                excess_stock_factor: 1.2,
                ..AlertSettings::default()
            },
        );
        evaluate(&lenient, &store, id);
        assert!(active_kinds(&lenient).is_empty());
    }

    #[test]
    fn test_low_threshold_percent() {
        let (_temp, store) = setup();
        let id = add_item(&store, 4, 10, 20);
        let engine = AlertEngine::new(
            &store,
            &AlertSettings {
                low_stock_threshold_percent: 50,
                ..AlertSettings::default()
            },
        );

        evaluate(&engine, &store, id);
        assert_eq!(active_kinds(&engine), vec![AlertKind::LowStock]);

        set_quantity(&store, id, 5);
        evaluate(&engine, &store, id);
        assert!(active_kinds(&engine).is_empty());
    }

    #[test]
    fn test_frequent_delivery_threshold() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 15, 1, 20);
        let employee = Employee::new("Ana Torres", "1002003");
        let employee_id = employee.id;
        store
            .transaction(|data| {
                data.employees.insert(employee_id, employee);
                Ok(())
            })
            .unwrap();

        for n in 1..=6 {
            store
                .transaction(|data| {
                    data.deliveries.push(Delivery::new(
                        employee_id,
                        id,
                        1,
                        Utc::now(),
                        "",
                        "",
                    ));
                    Ok(())
                })
                .unwrap();
            evaluate(&engine, &store, id);
            let frequent = active_kinds(&engine).contains(&AlertKind::FrequentDelivery);
            assert_eq!(frequent, n == 6, "after delivery {}", n);
        }
    }

    #[test]
    fn test_deliveries_outside_window_are_ignored() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 15, 1, 20);
        let employee = Employee::new("Ana Torres", "1002003");
        let employee_id = employee.id;
        let old = Utc::now() - Duration::hours(30);
        store
            .transaction(|data| {
                data.employees.insert(employee_id, employee);
                for _ in 0..10 {
                    data.deliveries
                        .push(Delivery::new(employee_id, id, 1, old, "", ""));
                }
                Ok(())
            })
            .unwrap();

        evaluate(&engine, &store, id);
        assert!(active_kinds(&engine).is_empty());
    }

    #[test]
    fn test_raise_upgrades_but_never_downgrades() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());

        let first = engine
            .raise(AlertKind::SystemError, AlertSeverity::Medium, None, "disk slow")
            .unwrap();
        let upgraded = engine
            .raise(AlertKind::SystemError, AlertSeverity::Critical, None, "disk full")
            .unwrap();
        let unchanged = engine
            .raise(AlertKind::SystemError, AlertSeverity::Low, None, "disk ok-ish")
            .unwrap();

        assert_eq!(first.id, upgraded.id);
        assert_eq!(upgraded.severity, AlertSeverity::Critical);
        assert_eq!(unchanged.severity, AlertSeverity::Critical);
        assert_eq!(unchanged.message, "disk full");
        assert_eq!(engine.list_active_alerts().unwrap().len(), 1);
    }

    #[test]
    fn test_manual_resolution_is_terminal_until_recurrence() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 3, 5, 20);
        evaluate(&engine, &store, id);

        let alert = engine.list_active_alerts().unwrap().remove(0);
        let resolved = engine.resolve(alert.id, "maria").unwrap();
        assert_eq!(
            resolved.resolution,
            Some(Resolution::Manual { operator: "maria".into() })
        );

        // still low: stays quiet
        evaluate(&engine, &store, id);
        assert!(engine.list_active_alerts().unwrap().is_empty());

        // clears, then recurs: a new alert opens
        set_quantity(&store, id, 10);
        evaluate(&engine, &store, id);
        set_quantity(&store, id, 2);
        evaluate(&engine, &store, id);

        let active = engine.list_active_alerts().unwrap();
        assert_eq!(active.len(), 1);
        assert_ne!(active[0].id, alert.id);
    }

    #[test]
    fn test_resolve_errors() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let alert = engine
            .raise(AlertKind::BackupFailed, AlertSeverity::High, None, "failed")
            .unwrap();

        assert!(engine.resolve(AlertId::new(), "ops").unwrap_err().is_not_found());
        assert!(engine.resolve(alert.id, " ").unwrap_err().is_validation());

        engine.resolve(alert.id, "ops").unwrap();
        assert!(engine.resolve(alert.id, "ops").unwrap_err().is_validation());
    }

    #[test]
    fn test_active_alerts_order() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        engine
            .raise(AlertKind::ExcessStock, AlertSeverity::Low, None, "a")
            .unwrap();
        engine
            .raise(AlertKind::BackupFailed, AlertSeverity::High, None, "b")
            .unwrap();
        engine
            .raise(AlertKind::SystemError, AlertSeverity::High, None, "c")
            .unwrap();
        engine
            .raise(AlertKind::CriticalStock, AlertSeverity::Critical, None, "d")
            .unwrap();

        let messages: Vec<_> = engine
            .list_active_alerts()
            .unwrap()
            .into_iter()
            .map(|a| a.message)
            .collect();
        assert_eq!(messages, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_summary_and_resolve_kind() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let low = add_item(&store, 1, 5, 20);
        let empty = add_item(&store, 0, 5, 20);
        evaluate(&engine, &store, low);
        evaluate(&engine, &store, empty);
        engine
            .raise(AlertKind::ExcessStock, AlertSeverity::Low, None, "x")
            .unwrap();

        let summary = engine.summary().unwrap();
        assert_eq!(summary.total_active, 3);
        assert_eq!(summary.action_required, 2);
        assert_eq!(summary.by_kind.get(&AlertKind::LowStock), Some(&1));
        assert_eq!(summary.by_severity.get(&AlertSeverity::Critical), Some(&1));

        let resolved = engine.resolve_kind(AlertKind::LowStock, "ops").unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(engine.summary().unwrap().total_active, 2);
    }

    #[test]
    fn test_inactive_item_alerts_are_resolved() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 0, 5, 20);
        evaluate(&engine, &store, id);

        store
            .transaction(|data| {
                data.items.get_mut(&id).unwrap().deactivate();
                Ok(())
            })
            .unwrap();
        let changes = engine.sweep().unwrap();

        assert_eq!(changes.resolved.len(), 1);
        assert!(engine.list_active_alerts().unwrap().is_empty());
    }

    #[test]
    fn test_sweep_raises_and_clears_consistency_error() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 10, 1, 20);
        let employee = Employee::new("Ana Torres", "1002003");
        store
            .transaction(|data| {
                data.deliveries
                    .push(Delivery::new(employee.id, id, 1, Utc::now(), "", ""));
                Ok(())
            })
            .unwrap();

        engine.sweep().unwrap();
        let active = engine.list_active_alerts().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].kind, AlertKind::SystemError);
        assert!(active[0].message.contains("unknown employee"));

        // A second sweep keeps the same alert open
        assert!(engine.sweep().unwrap().raised.is_empty());

        store
            .transaction(|data| {
                data.employees.insert(employee.id, employee);
                Ok(())
            })
            .unwrap();
        let changes = engine.sweep().unwrap();

        assert_eq!(changes.resolved.len(), 1);
        assert!(engine.list_active_alerts().unwrap().is_empty());
    }

    #[test]
    fn test_consistent_sweep_leaves_other_system_errors_open() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        engine
            .raise(AlertKind::SystemError, AlertSeverity::High, None, "restore swap failed")
            .unwrap();

        engine.sweep().unwrap();

        let active = engine.list_active_alerts().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].message, "restore swap failed");
    }

    #[test]
    fn test_sweep_at_expires_frequent_delivery() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let id = add_item(&store, 15, 1, 20);
        let employee = Employee::new("Ana Torres", "1002003");
        let employee_id = employee.id;
        let delivered_at = Utc::now();
        store
            .transaction(|data| {
                data.employees.insert(employee_id, employee);
                for _ in 0..6 {
                    data.deliveries
                        .push(Delivery::new(employee_id, id, 1, delivered_at, "", ""));
                }
                Ok(())
            })
            .unwrap();

        engine.sweep_at(delivered_at).unwrap();
        assert_eq!(active_kinds(&engine), vec![AlertKind::FrequentDelivery]);

        let changes = engine.sweep_at(delivered_at + Duration::hours(25)).unwrap();
        assert_eq!(changes.resolved.len(), 1);
        assert!(active_kinds(&engine).is_empty());
    }

    #[test]
    fn test_purge_resolved_keeps_recent() {
        let (_temp, store) = setup();
        let engine = AlertEngine::new(&store, &AlertSettings::default());
        let alert = engine
            .raise(AlertKind::SystemError, AlertSeverity::High, None, "x")
            .unwrap();
        engine.resolve(alert.id, "ops").unwrap();

        assert_eq!(engine.purge_resolved(30).unwrap(), 0);
        assert_eq!(engine.purge_resolved(0).unwrap(), 1);
    }
}
