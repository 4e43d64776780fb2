use std::collections::HashMap;

use crate::app::RenderableKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityDefId(pub u32);

/// A compiled prefab: what the world spawns when a scene asks for a def by name.
#[derive(Debug, Clone)]
pub struct EntityArchetype {
    pub id: EntityDefId,
    pub def_name: String,
    pub label: String,
    pub renderable: RenderableKind,
    pub hit_radius: Option<f32>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    entity_defs: Vec<EntityArchetype>,
    entity_ids_by_name: HashMap<String, EntityDefId>,
}

impl DefDatabase {
    pub fn from_entity_defs(mut entity_defs: Vec<EntityArchetype>) -> Self {
        let mut entity_ids_by_name = HashMap::with_capacity(entity_defs.len());
        for (idx, def) in entity_defs.iter_mut().enumerate() {
            let id = EntityDefId(idx as u32);
            def.id = id;
            entity_ids_by_name.insert(def.def_name.clone(), id);
        }
        Self {
            entity_defs,
            entity_ids_by_name,
        }
    }

    pub fn entity_def_id_by_name(&self, name: &str) -> Option<EntityDefId> {
        self.entity_ids_by_name.get(name).copied()
    }

    pub fn entity_def(&self, id: EntityDefId) -> Option<&EntityArchetype> {
        self.entity_defs.get(id.0 as usize)
    }

    pub fn entity_def_by_name(&self, name: &str) -> Option<&EntityArchetype> {
        self.entity_def_id_by_name(name)
            .and_then(|id| self.entity_def(id))
    }

    pub fn entity_defs(&self) -> &[EntityArchetype] {
        &self.entity_defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archetype(def_name: &str) -> EntityArchetype {
        EntityArchetype {
            id: EntityDefId(99),
            def_name: def_name.to_string(),
            label: def_name.to_uppercase(),
            renderable: RenderableKind::Placeholder,
            hit_radius: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn ids_follow_insertion_order_and_resolve_by_name() {
        let db = DefDatabase::from_entity_defs(vec![archetype("a"), archetype("b")]);

        assert_eq!(db.entity_def_id_by_name("a"), Some(EntityDefId(0)));
        assert_eq!(db.entity_def_id_by_name("b"), Some(EntityDefId(1)));
        assert_eq!(
            db.entity_def_by_name("b").map(|def| def.label.as_str()),
            Some("B")
        );
        assert!(db.entity_def_by_name("missing").is_none());
    }
}
