//! Paper-specific view of [`StateList`].

use crate::domain::entities::VdxPaper;
use crate::errors::ContractError;
use crate::ledger::state_list::StateList;
use crate::ports::outbound::WorldState;
use crate::PAPER_NAMESPACE;

/// Papers stored under the paper namespace.
pub struct PaperList<'a> {
    list: StateList<'a, VdxPaper>,
}

impl<'a> PaperList<'a> {
    /// Bind to a world-state stub.
    pub fn new(stub: &'a dyn WorldState) -> Self {
        Self {
            list: StateList::new(stub, PAPER_NAMESPACE),
        }
    }

    /// Store a new paper.
    ///
    /// # Errors
    ///
    /// `DuplicateKey` if the issuer already has a paper with this number.
    pub async fn add_paper(&self, paper: &VdxPaper) -> Result<(), ContractError> {
        self.list.add(paper).await
    }

    /// Load a paper by issuer and number.
    ///
    /// # Errors
    ///
    /// `NotFound` if absent.
    pub async fn get_paper(
        &self,
        issuer: &str,
        paper_number: &str,
    ) -> Result<VdxPaper, ContractError> {
        self.list.get(&[issuer, paper_number]).await
    }

    /// Persist a modified paper.
    ///
    /// # Errors
    ///
    /// World-state or serialization failures.
    pub async fn update_paper(&self, paper: &VdxPaper) -> Result<(), ContractError> {
        self.list.update(paper).await
    }
}
