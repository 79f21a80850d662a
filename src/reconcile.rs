//! Converges the local channel table onto a freshly fetched subscription list.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::db::Database;
use crate::model::Channels;
use crate::types::{Channel, RemoteChannel};
use crate::youtube::SubscriptionSource;

/// Channel names touched by one reconciliation run, grouped by action.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ReconcileReport {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// One line per touched channel, in insert/update/delete order.
    pub fn lines(&self) -> Vec<String> {
        let groups = [
            ("not found, adding to db", &self.inserted),
            ("found, updating db", &self.updated),
            ("not found remotely, deleting from db", &self.deleted),
        ];
        groups
            .into_iter()
            .flat_map(|(action, names)| names.iter().map(move |name| format!("{name}: {action}")))
            .collect()
    }
}

/// Pulls the current subscription list from `source` and reconciles the store against it.
pub fn sync_subscriptions(
    db: &Database,
    source: &mut impl SubscriptionSource,
) -> Result<ReconcileReport> {
    let local = Channels::load(db).context("failed to load local channels")?;
    let remote = source
        .fetch_subscriptions()
        .context("failed to fetch subscriptions")?;
    reconcile(db, &remote, &local)
}

/// Inserts new remote channels, refreshes changed names and descriptions, and deletes
/// local channels the remote no longer lists. Notes and tag links are never written.
///
/// Inserts and updates run before deletes. A departing channel whose name a remote entry
/// claims is deleted early so the name can pass on. A kept channel whose old name another
/// remote entry claims is parked under a placeholder first, which lets two channels swap names.
///
/// An empty `remote` list deletes every local channel.
pub fn reconcile(db: &Database, remote: &[RemoteChannel], local: &Channels) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();
    let mut seen: HashSet<&str> = HashSet::with_capacity(remote.len());
    let mut wanted: Vec<&RemoteChannel> = Vec::with_capacity(remote.len());

    for entry in remote {
        if seen.insert(entry.id.as_str()) {
            wanted.push(entry);
        } else {
            warn!(id = %entry.id, "remote list repeats channel; keeping first entry");
        }
    }

    let mut released: HashSet<&str> = HashSet::new();
    for entry in &wanted {
        let Some(holder) = local.get_by_name(&entry.name) else {
            continue;
        };
        if seen.contains(holder.id.as_str()) || released.contains(holder.id.as_str()) {
            continue;
        }
        delete_vanished(db, holder, &mut report)?;
        released.insert(holder.id.as_str());
    }

    let claimed: HashMap<&str, &str> = wanted
        .iter()
        .map(|entry| (entry.name.as_str(), entry.id.as_str()))
        .collect();
    for entry in &wanted {
        let Some(existing) = local.get(&entry.id) else {
            continue;
        };
        if existing.name == entry.name {
            continue;
        }
        if claimed
            .get(existing.name.as_str())
            .is_some_and(|claimant| *claimant != entry.id.as_str())
        {
            info!(id = %entry.id, name = %existing.name, "name claimed by another channel, parking");
            let parked = RemoteChannel::new(
                entry.id.clone(),
                parked_name(&entry.id),
                existing.description.clone(),
            );
            db.update_channel_details(&parked)
                .with_context(|| format!("failed to release name '{}'", existing.name))?;
        }
    }

    for entry in wanted {
        match local.get(&entry.id) {
            None => {
                info!(id = %entry.id, name = %entry.name, "not found, adding to db");
                db.insert_channel(entry)
                    .with_context(|| format!("failed to add channel '{}'", entry.name))?;
                report.inserted.push(entry.name.clone());
            }
            Some(existing)
                if existing.name != entry.name || existing.description != entry.description =>
            {
                info!(id = %entry.id, name = %entry.name, "found, updating db");
                db.update_channel_details(entry)
                    .with_context(|| format!("failed to update channel '{}'", entry.name))?;
                report.updated.push(entry.name.clone());
            }
            Some(_) => {}
        }
    }

    for existing in local.sorted() {
        if seen.contains(existing.id.as_str()) || released.contains(existing.id.as_str()) {
            continue;
        }
        delete_vanished(db, existing, &mut report)?;
    }

    Ok(report)
}

fn delete_vanished(db: &Database, existing: &Channel, report: &mut ReconcileReport) -> Result<()> {
    info!(id = %existing.id, name = %existing.name, "not found remotely, deleting from db");
    db.delete_channel(&existing.id)
        .with_context(|| format!("failed to delete channel '{}'", existing.name))?;
    report.deleted.push(existing.name.clone());
    Ok(())
}

/// Temporary name held while a rename round is in flight; never a real channel title.
fn parked_name(id: &str) -> String {
    format!("\u{1}{id}")
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn unchanged_remote_is_a_no_op() -> Result<()> {
        let db = Database::open(":memory:")?;
        let remote = vec![RemoteChannel::new("a", "Foo", "d")];
        reconcile(&db, &remote, &Channels::load(&db)?)?;

        let report = reconcile(&db, &remote, &Channels::load(&db)?)?;
        assert!(report.is_empty());
        Ok(())
    }

    #[test]
    fn description_change_triggers_update() -> Result<()> {
        let db = Database::open(":memory:")?;
        reconcile(&db, &[RemoteChannel::new("a", "Foo", "old")], &Channels::default())?;

        let report = reconcile(
            &db,
            &[RemoteChannel::new("a", "Foo", "new")],
            &Channels::load(&db)?,
        )?;
        assert_eq!(report.updated, vec!["Foo".to_string()]);
        let stored = db.get_channel("a")?.expect("channel should exist");
        assert_eq!(stored.description, "new");
        Ok(())
    }

    #[test]
    fn repeated_remote_ids_are_inserted_once() -> Result<()> {
        let db = Database::open(":memory:")?;
        let report = reconcile(
            &db,
            &[
                RemoteChannel::new("a", "Foo", ""),
                RemoteChannel::new("a", "Foo again", ""),
            ],
            &Channels::default(),
        )?;
        assert_eq!(report.inserted, vec!["Foo".to_string()]);
        assert_eq!(db.list_channels()?.len(), 1);
        Ok(())
    }

    #[test]
    fn empty_remote_deletes_everything() -> Result<()> {
        let db = Database::open(":memory:")?;
        reconcile(
            &db,
            &[RemoteChannel::new("a", "Foo", ""), RemoteChannel::new("b", "Bar", "")],
            &Channels::default(),
        )?;

        let report = reconcile(&db, &[], &Channels::load(&db)?)?;
        assert_eq!(report.deleted, vec!["Bar".to_string(), "Foo".to_string()]);
        assert!(db.list_channels()?.is_empty());
        Ok(())
    }

    #[test]
    fn departing_channel_hands_its_name_to_a_newcomer() -> Result<()> {
        let db = Database::open(":memory:")?;
        reconcile(&db, &[RemoteChannel::new("b", "Bar", "")], &Channels::default())?;

        let report = reconcile(
            &db,
            &[RemoteChannel::new("c", "Bar", "reborn")],
            &Channels::load(&db)?,
        )?;
        assert_eq!(report.deleted, vec!["Bar".to_string()]);
        assert_eq!(report.inserted, vec!["Bar".to_string()]);

        let channels = Channels::load(&db)?;
        assert_eq!(channels.len(), 1);
        assert_eq!(channels.get_by_name("Bar").map(|c| c.id.as_str()), Some("c"));
        Ok(())
    }

    #[test]
    fn kept_channels_can_swap_names() -> Result<()> {
        let db = Database::open(":memory:")?;
        reconcile(
            &db,
            &[RemoteChannel::new("a", "X", ""), RemoteChannel::new("b", "Y", "")],
            &Channels::default(),
        )?;
        db.update_channel_notes("a", "first")?;

        let report = reconcile(
            &db,
            &[RemoteChannel::new("a", "Y", ""), RemoteChannel::new("b", "X", "")],
            &Channels::load(&db)?,
        )?;
        assert_eq!(report.updated, vec!["Y".to_string(), "X".to_string()]);
        assert!(report.deleted.is_empty());

        let a = db.get_channel("a")?.expect("a is kept");
        assert_eq!(a.name, "Y");
        assert_eq!(a.notes, "first");
        assert_eq!(db.get_channel("b")?.map(|c| c.name), Some("X".to_string()));
        Ok(())
    }

    #[test]
    fn store_failures_are_surfaced() -> Result<()> {
        let db = Database::open(":memory:")?;
        let err = reconcile(
            &db,
            &[RemoteChannel::new("a", "Same", ""), RemoteChannel::new("b", "Same", "")],
            &Channels::default(),
        )
        .expect_err("duplicate names violate the unique constraint");
        assert!(format!("{err:#}").contains("failed to add channel 'Same'"));
        Ok(())
    }

    #[test]
    fn sync_reads_the_source_and_reports_lines() -> Result<()> {
        let db = Database::open(":memory:")?;
        db.insert_channel(&RemoteChannel::new("gone", "Gone", ""))?;
        let mut source = vec![RemoteChannel::new("a", "Foo", "")];

        let report = sync_subscriptions(&db, &mut source)?;
        assert_eq!(
            report.lines(),
            vec![
                "Foo: not found, adding to db".to_string(),
                "Gone: not found remotely, deleting from db".to_string(),
            ]
        );

        let again = sync_subscriptions(&db, &mut source)?;
        assert!(again.is_empty());
        Ok(())
    }
}
