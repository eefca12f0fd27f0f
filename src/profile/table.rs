//! Immutable binding tables published to the polling loop
//!
//! A [`CompiledProfile`] flattens one profile for one device model into a
//! table per context. The polling loop reads it through a [`TableHandle`]
//! once per tick; edits publish a fresh `Arc`, never mutate in place.

use super::{AxisSettings, Context, InputRef, Profile, QuickSelectSettings};
use crate::action::Action;
use crate::device::DeviceModel;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Two-level lookup for one context: exact bindings, then global
#[derive(Debug, Clone, PartialEq)]
pub struct BindingTable {
    pub context: Context,
    exact: HashMap<InputRef, Action>,
    global: HashMap<InputRef, Action>,
    /// Every bound chord from either level, longest first
    chords: Vec<Vec<u8>>,
    /// Buttons with a long-press binding at either level
    long_press: BTreeSet<u8>,
    quick_select: Vec<Action>,
}

impl BindingTable {
    pub fn build(profile: &Profile, context: Context) -> Self {
        let level = |c: Context| -> HashMap<InputRef, Action> {
            profile
                .bindings
                .get(&c)
                .map(|b| b.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default()
        };
        let exact = if context == Context::Global {
            HashMap::new()
        } else {
            level(context)
        };
        let global = level(Context::Global);

        let mut chords: Vec<Vec<u8>> = exact
            .keys()
            .chain(global.keys())
            .filter_map(|k| k.chord_members().map(<[u8]>::to_vec))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        // Longest first; ties keep a stable order
        chords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let long_press = exact
            .keys()
            .chain(global.keys())
            .filter_map(|k| match k {
                InputRef::LongPress(b) => Some(*b),
                _ => None,
            })
            .collect();

        Self {
            context,
            exact,
            global,
            chords,
            long_press,
            quick_select: profile.quick_select.entries_for(context).to_vec(),
        }
    }

    /// Exact context binding, else global, else nothing
    pub fn lookup(&self, input: &InputRef) -> Option<&Action> {
        self.exact.get(input).or_else(|| self.global.get(input))
    }

    pub fn chords(&self) -> &[Vec<u8>] {
        &self.chords
    }

    pub fn has_long_press(&self, button: u8) -> bool {
        self.long_press.contains(&button)
    }

    pub fn quick_select_entries(&self) -> &[Action] {
        &self.quick_select
    }

    /// Number of distinct bound inputs visible from this context
    pub fn len(&self) -> usize {
        self.global
            .keys()
            .filter(|k| !self.exact.contains_key(k))
            .count()
            + self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A profile flattened for one device model, one table per context
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProfile {
    pub profile_name: String,
    pub model: Arc<DeviceModel>,
    pub axes: AxisSettings,
    pub quick_select: QuickSelectSettings,
    tables: HashMap<Context, BindingTable>,
}

impl CompiledProfile {
    pub fn compile(profile: &Profile, model: Arc<DeviceModel>) -> Self {
        let tables = Context::ALL
            .into_iter()
            .map(|c| (c, BindingTable::build(profile, c)))
            .collect();
        Self {
            profile_name: profile.name.clone(),
            model,
            axes: profile.axes.clone(),
            quick_select: profile.quick_select.clone(),
            tables,
        }
    }

    /// Placeholder published before any controller connects
    pub fn empty(model: Arc<DeviceModel>) -> Self {
        let profile = Profile::new("", &model);
        Self::compile(&profile, model)
    }

    pub fn table(&self, context: Context) -> &BindingTable {
        // compile() fills every context
        &self.tables[&context]
    }
}

/// Atomically swappable reference to the active compiled profile
#[derive(Clone)]
pub struct TableHandle {
    current: Arc<RwLock<Arc<CompiledProfile>>>,
    epoch: Arc<AtomicU64>,
}

impl TableHandle {
    pub fn new(initial: CompiledProfile) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Single read per tick; the returned snapshot never changes underneath
    pub fn load(&self) -> Arc<CompiledProfile> {
        self.current.read().clone()
    }

    /// Replace the active profile; readers see old or new, never a mix
    pub fn publish(&self, next: CompiledProfile) -> u64 {
        *self.current.write() = Arc::new(next);
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Incremented by every publish
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Command;

    fn profile() -> Profile {
        Profile::new("Table", &DeviceModel::generic(16, 4, 0))
            .bind(Context::Global, InputRef::Button(0), Action::command(Command::Enter))
            .bind(Context::Global, InputRef::Button(1), Action::command(Command::Back))
            .bind(Context::Review, InputRef::Button(0), Action::command(Command::FlipCard))
            .bind(Context::Review, InputRef::chord([4, 0]).unwrap(), Action::command(Command::BuryCard))
            .bind(Context::Global, InputRef::chord([4, 5, 0]).unwrap(), Action::command(Command::Sync))
            .bind(Context::Review, InputRef::LongPress(2), Action::command(Command::MarkNote))
    }

    #[test]
    fn test_lookup_order() {
        let table = BindingTable::build(&profile(), Context::Review);
        assert_eq!(table.lookup(&InputRef::Button(0)), Some(&Action::command(Command::FlipCard)));
        assert_eq!(table.lookup(&InputRef::Button(1)), Some(&Action::command(Command::Back)));
        assert_eq!(table.lookup(&InputRef::Button(9)), None);
    }

    #[test]
    fn test_chords_sorted_longest_first() {
        let table = BindingTable::build(&profile(), Context::Review);
        assert_eq!(table.chords(), &[vec![0, 4, 5], vec![0, 4]]);

        let global = BindingTable::build(&profile(), Context::Global);
        assert_eq!(global.chords(), &[vec![0, 4, 5]]);
    }

    #[test]
    fn test_long_press_is_context_scoped() {
        let compiled = CompiledProfile::compile(&profile(), Arc::new(DeviceModel::generic(16, 4, 0)));
        assert!(compiled.table(Context::Review).has_long_press(2));
        assert!(!compiled.table(Context::Overview).has_long_press(2));
    }

    #[test]
    fn test_len_counts_shadowed_once() {
        let table = BindingTable::build(&profile(), Context::Review);
        // btn:0 (shadowed), btn:1, chord 4+0, chord 4+5+0, hold:2
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_publish_swaps_whole_snapshot() {
        let model = Arc::new(DeviceModel::generic(16, 4, 0));
        let handle = TableHandle::new(CompiledProfile::empty(model.clone()));
        let before = handle.load();
        assert!(before.table(Context::Global).is_empty());

        let epoch = handle.publish(CompiledProfile::compile(&profile(), model));
        assert_eq!(epoch, 1);
        assert_eq!(handle.epoch(), 1);

        // The old snapshot is untouched; a fresh load sees the new one
        assert!(before.table(Context::Global).is_empty());
        assert_eq!(handle.load().profile_name, "Table");
    }
}
