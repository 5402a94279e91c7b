//! Association graph: typed, symmetric, auto-severing relations between entities
//!
//! Every relationship the editor needs to answer "who points to me" for lives
//! here instead of in back-pointers stored on the entities themselves:
//! - Pane ↔ Document (binding)
//! - Pane ↔ Pane (clone group)
//! - Pane ↔ View, View ↔ Window (containment)
//! - Document/Pane ↔ Autosave, Document ↔ Watch (service registrations)
//!
//! Links are always stored on both endpoints. Entities are only ever removed
//! through [`Registry::destroy`], which severs every link naming the entity
//! before dropping it, so no query can observe a dangling peer.

use std::collections::{BTreeMap, HashMap, HashSet};

/// Kind tag used to filter associations by peer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Window,
    View,
    Pane,
    Document,
    Autosave,
    Watch,
}

/// An identifier that can participate in the association graph
pub trait Entity: Copy + Eq + std::hash::Hash {
    const KIND: EntityKind;

    fn raw(self) -> usize;

    fn from_raw(raw: usize) -> Self;

    fn entity_ref(self) -> EntityRef {
        EntityRef {
            kind: Self::KIND,
            raw: self.raw(),
        }
    }
}

/// Untyped handle stored inside the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub raw: usize,
}

/// Symmetric many-to-many relation registry
#[derive(Debug, Default)]
pub struct AssociationGraph {
    links: HashMap<EntityRef, HashMap<EntityKind, HashSet<usize>>>,
}

impl AssociationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `a` and `b` in both directions
    ///
    /// Returns true if the link did not exist yet. Linking an entity to
    /// itself is ignored.
    pub fn associate<A: Entity, B: Entity>(&mut self, a: A, b: B) -> bool {
        let (ra, rb) = (a.entity_ref(), b.entity_ref());
        if ra == rb {
            return false;
        }
        let added = self.insert_half(ra, rb);
        self.insert_half(rb, ra);
        added
    }

    /// Remove the link between `a` and `b`; absent links are not an error
    pub fn dissociate<A: Entity, B: Entity>(&mut self, a: A, b: B) -> bool {
        let (ra, rb) = (a.entity_ref(), b.entity_ref());
        let removed = self.remove_half(ra, rb);
        self.remove_half(rb, ra);
        removed
    }

    /// All peers of `entity` whose kind is `T`
    ///
    /// No ordering is guaranteed; callers that need a stable order sort the
    /// result.
    pub fn associations_of<T: Entity, E: Entity>(&self, entity: E) -> HashSet<T> {
        self.links
            .get(&entity.entity_ref())
            .and_then(|by_kind| by_kind.get(&T::KIND))
            .map(|peers| peers.iter().map(|&raw| T::from_raw(raw)).collect())
            .unwrap_or_default()
    }

    /// Peers of kind `T`, sorted by id
    pub fn sorted_associations_of<T: Entity + Ord, E: Entity>(&self, entity: E) -> Vec<T> {
        let mut peers: Vec<T> = self.associations_of(entity).into_iter().collect();
        peers.sort();
        peers
    }

    /// The lowest-numbered peer of kind `T`, for relations that are 1-to-1
    /// in practice (pane → document, pane → view)
    pub fn first_association<T: Entity + Ord, E: Entity>(&self, entity: E) -> Option<T> {
        self.associations_of::<T, E>(entity).into_iter().min()
    }

    pub fn is_associated<A: Entity, B: Entity>(&self, a: A, b: B) -> bool {
        self.links
            .get(&a.entity_ref())
            .and_then(|by_kind| by_kind.get(&B::KIND))
            .is_some_and(|peers| peers.contains(&b.raw()))
    }

    /// Total number of peers of any kind
    pub fn degree<E: Entity>(&self, entity: E) -> usize {
        self.links
            .get(&entity.entity_ref())
            .map(|by_kind| by_kind.values().map(HashSet::len).sum())
            .unwrap_or(0)
    }

    /// Destruction hook: drop every link naming `entity`, on both sides
    ///
    /// Returns the number of peers that lost a link.
    pub fn sever<E: Entity>(&mut self, entity: E) -> usize {
        let me = entity.entity_ref();
        let Some(by_kind) = self.links.remove(&me) else {
            return 0;
        };
        let mut touched = 0;
        for (kind, peers) in by_kind {
            for raw in peers {
                self.remove_half(EntityRef { kind, raw }, me);
                touched += 1;
            }
        }
        touched
    }

    /// Number of entities that currently hold at least one link
    pub fn linked_entities(&self) -> usize {
        self.links.len()
    }

    fn insert_half(&mut self, from: EntityRef, to: EntityRef) -> bool {
        self.links
            .entry(from)
            .or_default()
            .entry(to.kind)
            .or_default()
            .insert(to.raw)
    }

    fn remove_half(&mut self, from: EntityRef, to: EntityRef) -> bool {
        let Some(by_kind) = self.links.get_mut(&from) else {
            return false;
        };
        let removed = by_kind
            .get_mut(&to.kind)
            .is_some_and(|peers| peers.remove(&to.raw));
        if by_kind.get(&to.kind).is_some_and(HashSet::is_empty) {
            by_kind.remove(&to.kind);
        }
        if by_kind.is_empty() {
            self.links.remove(&from);
        }
        removed
    }
}

/// Owning store for one entity type
///
/// Allocates ids monotonically. Removal goes through [`Registry::destroy`] so
/// that severing graph links happens in the same step as dropping the value.
#[derive(Debug)]
pub struct Registry<K: Entity + Ord, V> {
    entries: BTreeMap<K, V>,
    next_id: usize,
}

impl<K: Entity + Ord, V> Registry<K, V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn insert(&mut self, value: V) -> K {
        let id = K::from_raw(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, value);
        id
    }

    pub fn get(&self, id: K) -> Option<&V> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut V> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: K) -> bool {
        self.entries.contains_key(&id)
    }

    /// Sever `id` from the graph and remove it
    pub fn destroy(&mut self, id: K, graph: &mut AssociationGraph) -> Option<V> {
        let value = self.entries.remove(&id)?;
        graph.sever(id);
        Some(value)
    }

    pub fn ids(&self) -> Vec<K> {
        self.entries.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Entity + Ord, V> Default for Registry<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
