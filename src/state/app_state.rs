use serde::{Deserialize, Serialize};

use crate::state::diagram_state::DiagramState;
use crate::state::theme::Theme;

pub const VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppState {
    pub diagrams: Vec<DiagramState>,
    pub theme: Theme,
}

impl AppState {
    pub fn new() -> Self {
        let mut state = Self {
            diagrams: Vec::new(),
            theme: Theme::default(),
        };
        // Start with one empty diagram
        state.diagrams.push(DiagramState::new());
        state
    }

    pub fn add_diagram(&mut self) -> &mut DiagramState {
        self.diagrams.push(DiagramState::new());
        self.diagrams.last_mut().unwrap()
    }

    pub fn remove_diagram(&mut self, diagram_id: u64) {
        self.diagrams.retain(|d| d.id != diagram_id);
    }

    pub fn diagram_by_id(&self, id: u64) -> Option<&DiagramState> {
        self.diagrams.iter().find(|d| d.id == id)
    }

    pub fn diagram_by_id_mut(&mut self, id: u64) -> Option<&mut DiagramState> {
        self.diagrams.iter_mut().find(|d| d.id == id)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagrams_are_independent() {
        let mut state = AppState::new();
        let second_id = state.add_diagram().id;
        state
            .diagram_by_id_mut(second_id)
            .unwrap()
            .set_reference("Average", 174.0605);

        let first = &state.diagrams[0];
        assert!(first.ref_std.is_none());
        assert!(state.diagram_by_id(second_id).unwrap().ref_std.is_some());
    }

    #[test]
    fn remove_diagram_by_id() {
        let mut state = AppState::new();
        let id = state.diagrams[0].id;
        state.remove_diagram(id);
        assert!(state.diagrams.is_empty());
    }
}
