//! Redundancy scanning
//!
//! Each candidate branch goes through one isolated trial:
//!
//! 1. copy it to the temporary branch and check that out
//! 2. rebase onto the reference (a conflict is aborted and ends the trial)
//! 3. after a clean rebase, compare HEAD with the reference head
//! 4. check the reference out again and force-delete the temporary branch
//!
//! Step 4 is owned by [`StagedTrial`]: it runs on the normal path through
//! [`StagedTrial::release`] and on every early return or panic through `Drop`.
//! Between trials the repository is on the reference with no temporary branch.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::CleanerError;
use crate::gateway::VcsGateway;
use crate::types::{
    BranchReport, CommitHash, DEFAULT_TEMP_BRANCH, RebaseOutcome, ScanReport, Verdict,
    is_reserved_temp_branch,
};

/// Observer for scan progress; has no influence on control flow
pub trait ProgressSink {
    /// A trial is about to start (`index` is zero-based)
    fn trial_started(&mut self, _branch: &str, _index: usize, _total: usize) {}

    /// A trial finished and its cleanup ran
    fn trial_finished(&mut self, branch: &str, completed: usize, total: usize);

    /// All trials are done
    fn scan_finished(&mut self) {}
}

/// Progress sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn trial_finished(&mut self, _branch: &str, _completed: usize, _total: usize) {}
}

/// Check that `reference` names a remote branch
///
/// A name that only resolves locally gets its own error so the user is told
/// why it was rejected.
pub fn ensure_remote_reference<G: VcsGateway + ?Sized>(
    gateway: &G,
    reference: &str,
) -> Result<(), CleanerError> {
    if gateway.has_remote_branch(reference) {
        return Ok(());
    }
    if gateway.has_local_branch(reference) {
        Err(CleanerError::ReferenceBranchLocalOnly {
            branch: reference.to_string(),
        })
    } else {
        Err(CleanerError::ReferenceBranchNotFound {
            branch: reference.to_string(),
        })
    }
}

/// Runs rebase trials for a set of candidate branches
pub struct RedundancyScanner<'a, G: VcsGateway + ?Sized> {
    gateway: &'a G,
    reference: String,
    temp_branch: String,
    skip: BTreeSet<String>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a, G: VcsGateway + ?Sized> RedundancyScanner<'a, G> {
    pub fn new(gateway: &'a G, reference: impl Into<String>) -> Self {
        Self {
            gateway,
            reference: reference.into(),
            temp_branch: DEFAULT_TEMP_BRANCH.to_string(),
            skip: BTreeSet::new(),
            cancel: None,
        }
    }

    /// Use a different staging branch name
    pub fn with_temp_branch(mut self, name: impl Into<String>) -> Self {
        self.temp_branch = name.into();
        self
    }

    /// Branches that are never analyzed
    pub fn with_skip<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(names.into_iter().map(Into::into));
        self
    }

    /// Stop before the next trial once `flag` is set
    pub fn with_cancellation(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn temp_branch(&self) -> &str {
        &self.temp_branch
    }

    /// Candidates in scan order: sorted, deduplicated, skip set and the
    /// staging branch removed
    pub fn candidates<S: AsRef<str>>(&self, branches: &[S]) -> Vec<String> {
        branches
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| *name != self.temp_branch && !self.skip.contains(*name))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Scan the given branches
    ///
    /// Checks out the reference, captures its head once, clears a stale
    /// staging branch from an interrupted run, then runs one trial per
    /// candidate. Only backend failures abort the scan; conflicts are
    /// recorded and the scan moves on.
    ///
    /// A staging branch name without the reserved `__name__` form is
    /// refused before anything touches the repository.
    pub fn scan<S: AsRef<str>>(
        &self,
        branches: &[S],
        progress: &mut dyn ProgressSink,
    ) -> Result<ScanReport, CleanerError> {
        if !is_reserved_temp_branch(&self.temp_branch) {
            return Err(CleanerError::Config(format!(
                "temp_branch {:?} must have the reserved __name__ form",
                self.temp_branch
            )));
        }
        let candidates = self.candidates(branches);
        let total = candidates.len();

        self.gateway.checkout(&self.reference, None)?;
        let reference_head = self.gateway.head_commit_hash()?;
        info!(reference = %self.reference, head = %reference_head, "captured reference head");

        self.clear_stale_temp_branch();

        let mut reports = Vec::with_capacity(total);
        for (index, branch) in candidates.iter().enumerate() {
            if self.is_cancelled() {
                return Err(CleanerError::Cancelled);
            }

            progress.trial_started(branch, index, total);
            let verdict = match self.run_trial(branch, &reference_head) {
                Ok(verdict) => verdict,
                // An interrupted git command fails on its own; report the interrupt
                Err(e) if self.is_cancelled() => {
                    warn!(branch = %branch, error = %e, "trial interrupted");
                    return Err(CleanerError::Cancelled);
                }
                Err(e) => return Err(e),
            };
            info!(branch = %branch, verdict = ?verdict, "trial finished");
            reports.push(BranchReport {
                branch: branch.clone(),
                verdict,
            });
            progress.trial_finished(branch, index + 1, total);
        }
        progress.scan_finished();

        Ok(ScanReport {
            reference_branch: self.reference.clone(),
            reference_head,
            branches: reports,
        })
    }

    fn run_trial(&self, branch: &str, reference_head: &CommitHash) -> Result<Verdict, CleanerError> {
        let trial = StagedTrial::stage(self.gateway, branch, &self.reference, &self.temp_branch)?;

        let verdict = match self.gateway.rebase(&self.reference)? {
            RebaseOutcome::Conflict => {
                self.gateway.abort_rebase();
                Verdict::Conflict
            }
            RebaseOutcome::Clean => {
                let head = self.gateway.head_commit_hash()?;
                if head == *reference_head {
                    Verdict::Redundant
                } else {
                    Verdict::Diverged { head }
                }
            }
        };

        trial.release()?;
        Ok(verdict)
    }

    /// Best-effort removal of a staging branch left by a crashed run
    fn clear_stale_temp_branch(&self) {
        if let Err(e) = self.gateway.delete_branch(&self.temp_branch, true) {
            warn!(branch = %self.temp_branch, error = %e, "could not remove stale temporary branch");
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

/// The temporary branch, checked out, for the duration of one trial
struct StagedTrial<'g, G: VcsGateway + ?Sized> {
    gateway: &'g G,
    reference: &'g str,
    temp_branch: &'g str,
    released: bool,
}

impl<'g, G: VcsGateway + ?Sized> StagedTrial<'g, G> {
    /// Create and check out the temporary branch at `branch`
    ///
    /// The guard exists before the checkout so a checkout that fails halfway
    /// is still cleaned up.
    fn stage(
        gateway: &'g G,
        branch: &str,
        reference: &'g str,
        temp_branch: &'g str,
    ) -> Result<Self, CleanerError> {
        let trial = Self {
            gateway,
            reference,
            temp_branch,
            released: false,
        };
        gateway.checkout(branch, Some(temp_branch))?;
        Ok(trial)
    }

    /// Return to the reference and delete the temporary branch
    fn release(mut self) -> Result<(), CleanerError> {
        self.released = true;
        self.restore()
    }

    fn restore(&self) -> Result<(), CleanerError> {
        self.gateway.checkout(self.reference, None)?;
        self.gateway.delete_branch(self.temp_branch, true)
    }
}

impl<G: VcsGateway + ?Sized> Drop for StagedTrial<'_, G> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.gateway.abort_rebase();
        if let Err(e) = self.restore() {
            warn!(error = %e, temp_branch = %self.temp_branch, "cleanup after failed trial did not complete");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashSet};

    const H: &str = "1111111111111111111111111111111111111111";
    const H_PRIME: &str = "2222222222222222222222222222222222222222";
    const TMP: &str = DEFAULT_TEMP_BRANCH;
    const REF: &str = "origin/master";

    /// What rebasing a given branch onto the reference produces
    #[derive(Clone)]
    enum Script {
        /// Clean rebase ending on this hash
        CleanTo(&'static str),
        Conflict,
        /// Rebase command itself fails without a rebase in progress
        RebaseFails,
        /// Checking out this branch fails
        CheckoutFails,
    }

    /// In-memory repository that records every call
    struct FakeRepo {
        remote: HashSet<String>,
        local: RefCell<BTreeMap<String, Script>>,
        reference_head: &'static str,
        head: RefCell<String>,
        checked_out: RefCell<String>,
        rebase_in_progress: RefCell<bool>,
        calls: RefCell<Vec<String>>,
        fail_next_temp_delete: RefCell<bool>,
    }

    impl FakeRepo {
        fn new(branches: &[(&str, Script)]) -> Self {
            Self {
                remote: [REF.to_string()].into_iter().collect(),
                local: RefCell::new(
                    branches
                        .iter()
                        .map(|(name, script)| (name.to_string(), script.clone()))
                        .collect(),
                ),
                reference_head: H,
                head: RefCell::new(String::new()),
                checked_out: RefCell::new("main".to_string()),
                rebase_in_progress: RefCell::new(false),
                calls: RefCell::new(Vec::new()),
                fail_next_temp_delete: RefCell::new(false),
            }
        }

        fn log(&self, call: String) {
            self.calls.borrow_mut().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn names(&self) -> Vec<String> {
            self.local.borrow().keys().cloned().collect()
        }

        fn assert_invariant(&self) {
            assert_eq!(*self.checked_out.borrow(), REF);
            assert!(!self.local.borrow().contains_key(TMP));
            assert!(!*self.rebase_in_progress.borrow());
        }
    }

    impl VcsGateway for FakeRepo {
        fn fetch_all(&self) -> Result<(), CleanerError> {
            self.log("fetch".to_string());
            Ok(())
        }

        fn has_local_branch(&self, name: &str) -> bool {
            self.local.borrow().contains_key(name)
        }

        fn has_remote_branch(&self, name: &str) -> bool {
            self.remote.contains(name)
        }

        fn local_branches(&self) -> Result<Vec<String>, CleanerError> {
            Ok(self.names())
        }

        fn is_working_tree_clean(&self) -> Result<bool, CleanerError> {
            Ok(true)
        }

        fn checkout(&self, branch: &str, new_branch: Option<&str>) -> Result<(), CleanerError> {
            self.log(format!("checkout {} {:?}", branch, new_branch));
            if branch == REF {
                *self.checked_out.borrow_mut() = REF.to_string();
                *self.head.borrow_mut() = self.reference_head.to_string();
                return Ok(());
            }
            let script = self
                .local
                .borrow()
                .get(branch)
                .cloned()
                .ok_or_else(|| CleanerError::backend("checkout", "no such branch"))?;
            if matches!(script, Script::CheckoutFails) {
                return Err(CleanerError::backend("checkout", "working tree unclean"));
            }
            let target = new_branch.unwrap_or(branch).to_string();
            if let Some(new_branch) = new_branch {
                if self.local.borrow().contains_key(new_branch) {
                    return Err(CleanerError::backend("checkout", "branch already exists"));
                }
                self.local.borrow_mut().insert(new_branch.to_string(), script);
            }
            *self.checked_out.borrow_mut() = target;
            Ok(())
        }

        fn rebase(&self, onto: &str) -> Result<RebaseOutcome, CleanerError> {
            self.log(format!("rebase {}", onto));
            let current = self.checked_out.borrow().clone();
            let script = self.local.borrow().get(&current).cloned();
            match script {
                Some(Script::CleanTo(hash)) => {
                    *self.head.borrow_mut() = hash.to_string();
                    Ok(RebaseOutcome::Clean)
                }
                Some(Script::Conflict) => {
                    *self.rebase_in_progress.borrow_mut() = true;
                    Ok(RebaseOutcome::Conflict)
                }
                _ => Err(CleanerError::backend("rebase", "could not apply")),
            }
        }

        fn abort_rebase(&self) {
            self.log("abort".to_string());
            *self.rebase_in_progress.borrow_mut() = false;
        }

        fn delete_branch(&self, name: &str, force: bool) -> Result<(), CleanerError> {
            self.log(format!("delete {} {}", name, force));
            if name == TMP && self.fail_next_temp_delete.replace(false) {
                return Err(CleanerError::backend("branch", "locked"));
            }
            let removed = self.local.borrow_mut().remove(name).is_some();
            if removed || force {
                Ok(())
            } else {
                Err(CleanerError::backend("branch", "not found"))
            }
        }

        fn head_commit_hash(&self) -> Result<CommitHash, CleanerError> {
            CommitHash::parse(&self.head.borrow())
        }
    }

    fn scan(repo: &FakeRepo) -> Result<ScanReport, CleanerError> {
        let branches = repo.local_branches()?;
        RedundancyScanner::new(repo, REF).scan(&branches, &mut NoProgress)
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Vec<(String, usize, usize)>,
        finished: Vec<(String, usize, usize)>,
        done: bool,
    }

    impl ProgressSink for RecordingProgress {
        fn trial_started(&mut self, branch: &str, index: usize, total: usize) {
            self.started.push((branch.to_string(), index, total));
        }

        fn trial_finished(&mut self, branch: &str, completed: usize, total: usize) {
            self.finished.push((branch.to_string(), completed, total));
        }

        fn scan_finished(&mut self) {
            self.done = true;
        }
    }

    #[test]
    fn test_identical_branch_is_redundant() {
        let repo = FakeRepo::new(&[("feature-a", Script::CleanTo(H))]);
        let report = scan(&repo).unwrap();
        assert_eq!(report.redundant(), vec!["feature-a"]);
        assert_eq!(report.reference_head.as_str(), H);
        repo.assert_invariant();
    }

    #[test]
    fn test_conflict_is_aborted_and_scan_continues() {
        let repo = FakeRepo::new(&[
            ("feature-a", Script::CleanTo(H)),
            ("feature-b", Script::Conflict),
            ("feature-d", Script::CleanTo(H)),
        ]);
        let report = scan(&repo).unwrap();
        assert_eq!(report.redundant(), vec!["feature-a", "feature-d"]);
        assert_eq!(report.branches[1].verdict, Verdict::Conflict);
        assert_eq!(
            repo.calls().iter().filter(|c| *c == "abort").count(),
            1,
            "abort runs once, for the conflicting branch"
        );
        repo.assert_invariant();
    }

    #[test]
    fn test_clean_rebase_to_other_hash_is_not_redundant() {
        let repo = FakeRepo::new(&[("feature-c", Script::CleanTo(H_PRIME))]);
        let report = scan(&repo).unwrap();
        assert!(report.redundant().is_empty());
        assert_eq!(
            report.branches[0].verdict,
            Verdict::Diverged {
                head: CommitHash::parse(H_PRIME).unwrap()
            }
        );
        repo.assert_invariant();
    }

    #[test]
    fn test_skip_set_excludes_qualifying_branch() {
        let repo = FakeRepo::new(&[
            ("feature-a", Script::CleanTo(H)),
            ("feature-e", Script::CleanTo(H)),
        ]);
        let branches = repo.names();
        let report = RedundancyScanner::new(&repo, REF)
            .with_skip(["feature-a"])
            .scan(&branches, &mut NoProgress)
            .unwrap();
        assert_eq!(report.redundant(), vec!["feature-e"]);
        assert!(report.branches.iter().all(|b| b.branch != "feature-a"));
        assert!(
            !repo.calls().iter().any(|c| c.starts_with("checkout feature-a")),
            "skipped branches are never touched"
        );
    }

    #[test]
    fn test_trial_call_sequence() {
        let repo = FakeRepo::new(&[("feature-a", Script::CleanTo(H))]);
        scan(&repo).unwrap();
        assert_eq!(
            repo.calls(),
            vec![
                format!("checkout {} None", REF),
                format!("delete {} true", TMP),
                format!("checkout feature-a Some(\"{}\")", TMP),
                format!("rebase {}", REF),
                format!("checkout {} None", REF),
                format!("delete {} true", TMP),
            ]
        );
    }

    #[test]
    fn test_stale_temp_branch_removed_before_scan() {
        let repo = FakeRepo::new(&[
            (TMP, Script::CleanTo(H)),
            ("feature-a", Script::CleanTo(H)),
        ]);
        let report = scan(&repo).unwrap();
        assert_eq!(report.redundant(), vec!["feature-a"]);
        assert!(report.branches.iter().all(|b| b.branch != TMP));
        repo.assert_invariant();
    }

    #[test]
    fn test_stale_temp_branch_delete_failure_is_not_fatal() {
        let repo = FakeRepo::new(&[("feature-a", Script::CleanTo(H))]);
        *repo.fail_next_temp_delete.borrow_mut() = true;
        let report = scan(&repo).unwrap();
        assert_eq!(report.redundant(), vec!["feature-a"]);
        repo.assert_invariant();
    }

    #[test]
    fn test_cleanup_failure_after_trial_is_fatal() {
        let repo = FakeRepo::new(&[("a", Script::CleanTo(H))]);
        repo.checkout(REF, None).unwrap();
        let head = repo.head_commit_hash().unwrap();
        *repo.fail_next_temp_delete.borrow_mut() = true;

        let err = RedundancyScanner::new(&repo, REF)
            .run_trial("a", &head)
            .unwrap_err();
        assert!(matches!(err, CleanerError::Backend { ref command, .. } if command == "branch"));
        assert_eq!(*repo.checked_out.borrow(), REF);
    }

    #[test]
    fn test_backend_failure_still_cleans_up() {
        let repo = FakeRepo::new(&[
            ("feature-a", Script::CleanTo(H)),
            ("feature-x", Script::RebaseFails),
            ("feature-z", Script::CleanTo(H)),
        ]);
        let err = scan(&repo).unwrap_err();
        assert!(matches!(err, CleanerError::Backend { ref command, .. } if command == "rebase"));
        repo.assert_invariant();
        assert!(
            !repo.calls().iter().any(|c| c.starts_with("checkout feature-z")),
            "scan stops at the failing branch"
        );
    }

    #[test]
    fn test_checkout_failure_still_cleans_up() {
        let repo = FakeRepo::new(&[("feature-a", Script::CheckoutFails)]);
        let err = scan(&repo).unwrap_err();
        assert!(matches!(err, CleanerError::Backend { ref command, .. } if command == "checkout"));
        repo.assert_invariant();
    }

    #[test]
    fn test_scan_is_idempotent() {
        let repo = FakeRepo::new(&[
            ("a", Script::CleanTo(H)),
            ("b", Script::Conflict),
            ("c", Script::CleanTo(H_PRIME)),
            ("d", Script::CleanTo(H)),
        ]);
        let first = scan(&repo).unwrap();
        let second = scan(&repo).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.redundant(), vec!["a", "d"]);
    }

    #[test]
    fn test_candidates_sorted_and_deduplicated() {
        let repo = FakeRepo::new(&[]);
        let scanner = RedundancyScanner::new(&repo, REF).with_skip(["skip-me"]);
        let candidates = scanner.candidates(&["zeta", "alpha", TMP, "skip-me", "alpha", "Beta"]);
        assert_eq!(candidates, vec!["Beta", "alpha", "zeta"]);
    }

    #[test]
    fn test_progress_reports_each_trial() {
        let repo = FakeRepo::new(&[("a", Script::CleanTo(H)), ("b", Script::Conflict)]);
        let branches = repo.names();
        let mut progress = RecordingProgress::default();
        RedundancyScanner::new(&repo, REF)
            .scan(&branches, &mut progress)
            .unwrap();
        assert_eq!(
            progress.started,
            vec![("a".to_string(), 0, 2), ("b".to_string(), 1, 2)]
        );
        assert_eq!(
            progress.finished,
            vec![("a".to_string(), 1, 2), ("b".to_string(), 2, 2)]
        );
        assert!(progress.done);
    }

    #[test]
    fn test_cancellation_stops_between_trials() {
        struct CancelAfterFirst<'f>(&'f AtomicBool);
        impl ProgressSink for CancelAfterFirst<'_> {
            fn trial_finished(&mut self, _branch: &str, _completed: usize, _total: usize) {
                self.0.store(true, Ordering::SeqCst);
            }
        }

        let repo = FakeRepo::new(&[("a", Script::CleanTo(H)), ("b", Script::CleanTo(H))]);
        let branches = repo.names();
        let flag = AtomicBool::new(false);
        let err = RedundancyScanner::new(&repo, REF)
            .with_cancellation(&flag)
            .scan(&branches, &mut CancelAfterFirst(&flag))
            .unwrap_err();
        assert!(matches!(err, CleanerError::Cancelled));
        assert!(!repo.calls().iter().any(|c| c.starts_with("checkout b")));
        repo.assert_invariant();
    }

    #[test]
    fn test_failure_after_interrupt_reports_cancelled() {
        let repo = FakeRepo::new(&[("a", Script::RebaseFails)]);
        let branches = repo.names();
        let flag = AtomicBool::new(false);

        struct CancelOnStart<'f>(&'f AtomicBool);
        impl ProgressSink for CancelOnStart<'_> {
            fn trial_started(&mut self, _branch: &str, _index: usize, _total: usize) {
                self.0.store(true, Ordering::SeqCst);
            }
            fn trial_finished(&mut self, _branch: &str, _completed: usize, _total: usize) {}
        }

        let err = RedundancyScanner::new(&repo, REF)
            .with_cancellation(&flag)
            .scan(&branches, &mut CancelOnStart(&flag))
            .unwrap_err();
        assert!(matches!(err, CleanerError::Cancelled));
        repo.assert_invariant();
    }

    #[test]
    fn test_custom_temp_branch_name() {
        let repo = FakeRepo::new(&[("a", Script::CleanTo(H))]);
        let branches = repo.names();
        let scanner = RedundancyScanner::new(&repo, REF).with_temp_branch("__other__");
        assert_eq!(scanner.temp_branch(), "__other__");
        scanner.scan(&branches, &mut NoProgress).unwrap();
        assert!(
            repo.calls()
                .contains(&"checkout a Some(\"__other__\")".to_string())
        );
    }

    #[test]
    fn test_regular_branch_as_temp_branch_is_refused() {
        let repo = FakeRepo::new(&[("a", Script::CleanTo(H)), ("wip", Script::CleanTo(H))]);
        let branches = repo.names();
        let err = RedundancyScanner::new(&repo, REF)
            .with_temp_branch("wip")
            .scan(&branches, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, CleanerError::Config(_)));
        assert!(repo.calls().is_empty());
    }

    #[test]
    fn test_ensure_remote_reference() {
        let repo = FakeRepo::new(&[("master", Script::CleanTo(H))]);
        assert!(ensure_remote_reference(&repo, REF).is_ok());

        let err = ensure_remote_reference(&repo, "master").unwrap_err();
        assert!(matches!(err, CleanerError::ReferenceBranchLocalOnly { .. }));

        let err = ensure_remote_reference(&repo, "origin/nope").unwrap_err();
        assert!(matches!(err, CleanerError::ReferenceBranchNotFound { .. }));
    }
}
