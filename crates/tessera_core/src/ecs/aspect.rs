//! # Aspects
//!
//! An aspect is the interest predicate of a subscription: components an
//! entity must all have, must not have, and must have at least one of.
//!
//! Aspects are described with an [`AspectBuilder`] holding kind tokens, then
//! compiled against a world's registry into three bit compositions.

use std::collections::BTreeSet;

use super::component::{ComponentKind, ComponentTypeRegistry};
use super::composition::BitComposition;
use crate::error::EcsResult;

/// Compiled require / exclude / require-one predicate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Aspect {
    require: BitComposition,
    exclude: BitComposition,
    require_one: BitComposition,
}

impl Aspect {
    /// Builds an aspect directly from compositions.
    #[must_use]
    pub fn from_compositions(
        require: BitComposition,
        exclude: BitComposition,
        require_one: BitComposition,
    ) -> Self {
        Self {
            require,
            exclude,
            require_one,
        }
    }

    /// Bits an entity must all possess.
    #[must_use]
    pub fn require(&self) -> &BitComposition {
        &self.require
    }

    /// Bits an entity must not possess.
    #[must_use]
    pub fn exclude(&self) -> &BitComposition {
        &self.exclude
    }

    /// Bits of which an entity must possess at least one.
    #[must_use]
    pub fn require_one(&self) -> &BitComposition {
        &self.require_one
    }

    /// Returns whether this aspect accepts `composition`.
    ///
    /// An aspect with all predicates empty accepts everything.
    #[must_use]
    pub fn is_interested(&self, composition: &BitComposition) -> bool {
        if !self.require.is_empty() && !composition.contains_all(&self.require) {
            return false;
        }

        if !self.exclude.is_empty() && self.exclude.intersects(composition) {
            return false;
        }

        if !self.require_one.is_empty() && !self.require_one.intersects(composition) {
            return false;
        }

        true
    }
}

/// Declarative description of an aspect, keyed by component kinds.
///
/// Equality and hash are structural over the three kind sets, so builders
/// assembled separately with the same content share one subscription.
/// Duplicate kinds and argument order do not matter.
///
/// # Example
///
/// ```rust,ignore
/// let builder = AspectBuilder::new()
///     .require([position, velocity])
///     .exclude([frozen]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AspectBuilder {
    require: BTreeSet<ComponentKind>,
    exclude: BTreeSet<ComponentKind>,
    require_one: BTreeSet<ComponentKind>,
}

impl AspectBuilder {
    /// Empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose aspect accepts every entity.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds kinds the entity must all have.
    #[must_use]
    pub fn require<K: Into<ComponentKind>>(mut self, kinds: impl IntoIterator<Item = K>) -> Self {
        self.require.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Adds kinds the entity must not have.
    #[must_use]
    pub fn exclude<K: Into<ComponentKind>>(mut self, kinds: impl IntoIterator<Item = K>) -> Self {
        self.exclude.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Adds kinds of which the entity must have at least one.
    #[must_use]
    pub fn require_one<K: Into<ComponentKind>>(
        mut self,
        kinds: impl IntoIterator<Item = K>,
    ) -> Self {
        self.require_one.extend(kinds.into_iter().map(Into::into));
        self
    }

    /// Compiles the aspect, registering any kind the world has not seen yet.
    ///
    /// Safe to call repeatedly; equal builders produce equal aspects.
    #[must_use]
    pub fn build(&self, registry: &mut ComponentTypeRegistry) -> Aspect {
        let mut resolve = |kinds: &BTreeSet<ComponentKind>| {
            kinds
                .iter()
                .map(|&kind| registry.index_for(kind))
                .collect::<BitComposition>()
        };

        Aspect {
            require: resolve(&self.require),
            exclude: resolve(&self.exclude),
            require_one: resolve(&self.require_one),
        }
    }

    /// Compiles the aspect against kinds that must already be registered.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponentType`](crate::EcsError::UnknownComponentType)
    /// for the first kind the registry does not know.
    pub fn try_build(&self, registry: &ComponentTypeRegistry) -> EcsResult<Aspect> {
        let resolve = |kinds: &BTreeSet<ComponentKind>| -> EcsResult<BitComposition> {
            let mut bits = BitComposition::new();
            for &kind in kinds {
                bits.set(registry.lookup(kind)?.index());
            }
            Ok(bits)
        };

        Ok(Aspect {
            require: resolve(&self.require)?,
            exclude: resolve(&self.exclude)?,
            require_one: resolve(&self.require_one)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::Component;
    use crate::error::EcsError;

    struct X;
    impl Component for X {}
    struct Y;
    impl Component for Y {}
    struct Z;
    impl Component for Z {}

    fn composition(registry: &mut ComponentTypeRegistry, kinds: &[ComponentKind]) -> BitComposition {
        kinds.iter().map(|&k| registry.index_for(k)).collect()
    }

    #[test]
    fn test_require_and_exclude_table() {
        let mut registry = ComponentTypeRegistry::new();
        let (x, y) = (ComponentKind::of::<X>(), ComponentKind::of::<Y>());
        let aspect = AspectBuilder::new().require([x]).exclude([y]).build(&mut registry);

        assert!(aspect.is_interested(&composition(&mut registry, &[x])));
        assert!(!aspect.is_interested(&composition(&mut registry, &[x, y])));
        assert!(!aspect.is_interested(&BitComposition::new()));
    }

    #[test]
    fn test_require_one_table() {
        let mut registry = ComponentTypeRegistry::new();
        let (x, y, z) = (
            ComponentKind::of::<X>(),
            ComponentKind::of::<Y>(),
            ComponentKind::of::<Z>(),
        );
        let aspect = AspectBuilder::new().require_one([x, z]).build(&mut registry);

        assert!(!aspect.is_interested(&composition(&mut registry, &[y])));
        assert!(aspect.is_interested(&composition(&mut registry, &[x])));
    }

    #[test]
    fn test_empty_aspect_accepts_everything() {
        let mut registry = ComponentTypeRegistry::new();
        let aspect = AspectBuilder::all().build(&mut registry);
        let x = ComponentKind::of::<X>();

        assert!(aspect.is_interested(&BitComposition::new()));
        assert!(aspect.is_interested(&composition(&mut registry, &[x])));
    }

    #[test]
    fn test_builder_equality_is_structural() {
        let (x, y) = (ComponentKind::of::<X>(), ComponentKind::of::<Y>());
        let a = AspectBuilder::new().require([x, y]).exclude([y]);
        let b = AspectBuilder::new().exclude([y, y]).require([y]).require([x]);
        assert_eq!(a, b);

        let c = AspectBuilder::new().require([x]).exclude([y]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut registry = ComponentTypeRegistry::new();
        let builder = AspectBuilder::new().require([ComponentKind::of::<Z>()]);
        let first = builder.build(&mut registry);
        let second = builder.build(&mut registry);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_try_build_requires_registration() {
        let mut registry = ComponentTypeRegistry::new();
        let builder = AspectBuilder::new().require([ComponentKind::of::<X>()]);
        assert!(matches!(
            builder.try_build(&registry),
            Err(EcsError::UnknownComponentType { .. })
        ));

        registry.register::<X>();
        let aspect = builder.try_build(&registry).unwrap();
        assert!(aspect.require().get(0));
    }

    #[test]
    fn test_from_compositions_matches_builder() {
        let mut registry = ComponentTypeRegistry::new();
        let (x, y) = (ComponentKind::of::<X>(), ComponentKind::of::<Y>());
        let built = AspectBuilder::new().require([x]).exclude([y]).build(&mut registry);

        let direct = Aspect::from_compositions(
            [0].into_iter().collect(),
            [1].into_iter().collect(),
            BitComposition::new(),
        );
        assert_eq!(direct, built);
        assert!(direct.exclude().get(1));
        assert!(direct.require_one().is_empty());
    }
}
