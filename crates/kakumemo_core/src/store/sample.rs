//! First-run sample content.

use super::{new_entity_id, NoteStore, StoreResult};
use crate::repo::kv_repo::KeyValueStore;
use log::info;

const SAMPLE_GAME: &str = "Street Fighter 6";
const SAMPLE_CHARACTER: &str = "Ryu";

/// `(category, note title, note markdown)`.
const SAMPLE_NOTES: &[(&str, &str, &str)] = &[
    (
        "Normals",
        "Normals overview",
        "# Ryu normals\n\n## Standing\n- st.LP: 4f startup\n- st.MP: 6f startup\n- st.HP: 8f startup",
    ),
    (
        "Specials",
        "Hadoken",
        "# Hadoken\n\n**Command**: ↓↘→ + P\n\n## Startup\n- LP: 13f\n- MP: 15f\n- HP: 17f",
    ),
    (
        "Combos",
        "BnB combos",
        "# Ryu BnB\n\n## Basics\n1. cr.MP → cr.MK → Hadoken\n2. j.HP → st.HP → Shoryuken",
    ),
];

impl<S: KeyValueStore> NoteStore<S> {
    /// Creates the sample game when the store has no games yet.
    ///
    /// The whole sample is written with a single flush. Returns whether
    /// anything was created.
    pub fn seed_sample_data(&mut self) -> StoreResult<bool> {
        if self.state.tree.game_count() > 0 {
            return Ok(false);
        }

        self.commit("sample_seed", |state, now| {
            let game = state
                .tree
                .add_game(new_entity_id(), SAMPLE_GAME.to_string(), now)?;
            let character = state.tree.add_character(
                &game.id,
                new_entity_id(),
                SAMPLE_CHARACTER.to_string(),
                now,
            )?;
            for (category_name, title, content) in SAMPLE_NOTES {
                let category = state.tree.add_category(
                    &character.id,
                    new_entity_id(),
                    (*category_name).to_string(),
                    now,
                )?;
                state.tree.add_file(
                    &category.id,
                    new_entity_id(),
                    (*title).to_string(),
                    (*content).to_string(),
                    now,
                )?;
            }
            Ok(())
        })?;

        info!(
            "event=sample_seed module=store status=ok files={}",
            SAMPLE_NOTES.len()
        );
        Ok(true)
    }
}
