use std::sync::Arc;

use chrono::Utc;

use crate::{
    tasks::{bandit::Bandit, context_builder::ContextBuilder, frontier_manager::FrontierManager},
    types::{
        configs::run_config::RunConfig,
        error::AppError,
        structs::{
            candidate::Candidate,
            context::Context,
            decision::{
                Action, Decision, DecisionLog, DecisionRecord, Outcome, RunSummary, StopReason,
            },
            link::Link,
            page::FetchedPage,
        },
        traits::{
            fetcher::Fetcher, link_extractor::LinkExtractor, object_store::ObjectStore,
            relevance_scorer::RelevanceScorer, reward_policy::RewardPolicy,
        },
    },
    utils::cancel::CancellationFlag,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Running,
    BudgetExhausted,
    FrontierEmpty,
    Done(StopReason),
}

/// The pluggable parts of a crawl. They are built before the run and shared
/// with it, nothing here is global.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub scorer: Arc<dyn RelevanceScorer>,
    pub reward_policy: Arc<dyn RewardPolicy>,
    // Store the fetcher persists bodies into. Copies of pages that could not
    // be mined for links are removed from it.
    pub repository: Option<Arc<dyn ObjectStore>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    pub reason: StopReason,
    pub summary: RunSummary,
}

// What a successful download contributed.
struct Absorbed {
    relevance: f64,
    links: usize,
    reward: f64,
    exhausted: bool,
    storage_key: Option<String>,
}

/// Sequential crawl loop: pull a candidate, let the bandit decide, act,
/// reward, record. Owns the bandit and the frontier, so every update and
/// every charge happens in decision order.
pub struct Crawler {
    subject: String,
    skip_reward: f64,
    max_decisions: Option<usize>,
    seed: Option<Link>,
    collaborators: Collaborators,
    contexts: ContextBuilder,
    bandit: Bandit,
    frontier: FrontierManager,
    log: DecisionLog,
    state: CrawlState,
    cancel: CancellationFlag,
    decisions: usize,
}

impl Crawler {
    pub fn new(config: &RunConfig, collaborators: Collaborators) -> Result<Self, AppError> {
        config.validate()?;

        let start = config.start_link()?;
        let bandit = Bandit::from_config(&config.bandit, ContextBuilder::DIMENSION, config.threshold())?;
        let mut frontier = FrontierManager::new(config.frontier, config.budget_bytes);

        let seed = if config.download_seed {
            Some(start)
        } else {
            frontier.offer(vec![Candidate::seed(start)]);
            None
        };

        Ok(Self {
            subject: config.subject.clone(),
            skip_reward: config.skip_reward,
            max_decisions: config.max_decisions,
            seed,
            contexts: ContextBuilder::new(collaborators.scorer.clone()),
            collaborators,
            bandit,
            frontier,
            log: DecisionLog::new(),
            state: CrawlState::Running,
            cancel: CancellationFlag::new(),
            decisions: 0,
        })
    }

    /// Handle that stops the run before its next decision.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    pub fn bandit(&self) -> &Bandit {
        &self.bandit
    }

    pub fn frontier(&self) -> &FrontierManager {
        &self.frontier
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn log(&self) -> &DecisionLog {
        &self.log
    }

    pub fn into_log(self) -> DecisionLog {
        self.log
    }

    pub async fn run(&mut self) -> Result<CrawlReport, AppError> {
        log::info!("crawling for {:?}", self.subject);

        let reason = loop {
            if let CrawlState::Done(reason) = self.step().await? {
                break reason;
            }
        };

        let summary = self.log.summarize(reason);

        log::info!(
            "done ({:?}): {} decisions, {} downloads ({} failed), {} bytes, mean download reward {:.3}",
            summary.reason,
            summary.decisions,
            summary.downloads,
            summary.failed_downloads,
            summary.bytes,
            summary.mean_download_reward
        );

        Ok(CrawlReport { reason, summary })
    }

    /// Advances the state machine by one transition. Only configuration
    /// errors escape, every other failure is recorded as an outcome.
    pub async fn step(&mut self) -> Result<CrawlState, AppError> {
        match self.state {
            CrawlState::Done(_) => return Ok(self.state),
            CrawlState::BudgetExhausted => return Ok(self.finish(StopReason::BudgetExhausted)),
            CrawlState::FrontierEmpty => return Ok(self.finish(StopReason::FrontierEmpty)),
            CrawlState::Running => {}
        }

        if self.cancel.is_cancelled() {
            return Ok(self.finish(StopReason::Cancelled));
        }

        if matches!(self.max_decisions, Some(max) if self.decisions >= max) {
            return Ok(self.finish(StopReason::DecisionLimit));
        }

        if self.frontier.is_exhausted() {
            return Ok(self.transition(CrawlState::BudgetExhausted));
        }

        if let Some(seed) = self.seed.take() {
            self.bootstrap(seed).await?;
            return Ok(self.state);
        }

        let candidate = match self.frontier.next() {
            Some(candidate) => candidate,
            None => return Ok(self.transition(CrawlState::FrontierEmpty)),
        };

        let context = self.contexts.build(&candidate, &self.subject)?;
        let decision = self.bandit.decide(&context)?;

        let fetched = match decision.action {
            Action::Skip => None,
            Action::Download => Some(self.collaborators.fetcher.fetch(&candidate.link).await),
        };

        let (reward, outcome, exhausted) = match fetched {
            None => (self.skip_reward, Outcome::Skipped, false),
            Some(Ok(page)) => {
                let absorbed = self.absorb(&candidate, &page).await?;
                let outcome = Outcome::Downloaded {
                    bytes: page.size(),
                    relevance: absorbed.relevance,
                    links: absorbed.links,
                    storage_key: absorbed.storage_key,
                };
                (absorbed.reward, outcome, absorbed.exhausted)
            }
            Some(Err(e)) if e.is_fatal() => return Err(e),
            Some(Err(e)) => {
                log::warn!("failed to fetch {}: {}", candidate.link, e);
                let outcome = Outcome::FetchFailed {
                    error: e.to_string(),
                };
                (0.0, outcome, false)
            }
        };

        self.bandit
            .update(decision.arm_id, &context, decision.action, reward)?;
        self.frontier.record_visited(&candidate.link);
        self.decisions += 1;

        log::debug!(
            "#{} {:?} {} by {} (score {:.3}{}) reward {:.3}",
            self.decisions,
            decision.action,
            candidate.link,
            decision.arm_name,
            decision.estimate.score(),
            if decision.explored { ", explored" } else { "" },
            reward
        );

        self.record(&candidate, &context, Some(&decision), decision.action, reward, outcome);

        if exhausted {
            return Ok(self.transition(CrawlState::BudgetExhausted));
        }

        Ok(self.state)
    }

    // Fetches the seed without asking the bandit so that the frontier has
    // something to decide on.
    async fn bootstrap(&mut self, seed: Link) -> Result<(), AppError> {
        let candidate = Candidate::seed(seed);
        let context = self.contexts.build(&candidate, &self.subject)?;

        self.frontier.record_visited(&candidate.link);

        let fetched = self.collaborators.fetcher.fetch(&candidate.link).await;

        let (reward, outcome, exhausted) = match fetched {
            Ok(page) => {
                let absorbed = self.absorb(&candidate, &page).await?;
                log::info!(
                    "seed {} fetched: {} bytes, relevance {:.3}, {} links",
                    candidate.link,
                    page.size(),
                    absorbed.relevance,
                    absorbed.links
                );
                let outcome = Outcome::Bootstrap {
                    bytes: page.size(),
                    relevance: absorbed.relevance,
                    links: absorbed.links,
                    storage_key: absorbed.storage_key,
                };
                (absorbed.reward, outcome, absorbed.exhausted)
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("failed to fetch seed {}: {}", candidate.link, e);
                let outcome = Outcome::FetchFailed {
                    error: e.to_string(),
                };
                (0.0, outcome, false)
            }
        };

        self.record(&candidate, &context, None, Action::Download, reward, outcome);

        if exhausted {
            self.transition(CrawlState::BudgetExhausted);
        }

        Ok(())
    }

    // Scores, charges and mines a downloaded page.
    async fn absorb(&mut self, candidate: &Candidate, page: &FetchedPage) -> Result<Absorbed, AppError> {
        let relevance = self.page_relevance(page)?;
        let reward = self
            .collaborators
            .reward_policy
            .reward(relevance, page.size());
        let charge = self.frontier.charge(page.size());

        let mut storage_key = page.storage_key.clone();

        let discovered = match self.collaborators.extractor.extract_links(page).await {
            Ok(links) => links,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::warn!("failed to extract links from {}: {}", page.link, e);
                storage_key = self.discard_copy(page).await;
                vec![]
            }
        };

        let links = discovered.len();
        let children: Vec<Candidate> = discovered
            .into_iter()
            .filter_map(|found| match page.resolve(&found.href) {
                Ok(link) => Some(Candidate::discovered(
                    link,
                    found.anchor_text,
                    candidate.depth + 1,
                    relevance,
                )),
                Err(_) => None,
            })
            .collect();

        let accepted = self.frontier.offer(children);
        log::debug!(
            "{}: {} new candidates, {} queued, {} bytes left",
            page.link,
            accepted,
            self.frontier.len(),
            charge.remaining
        );

        Ok(Absorbed {
            relevance,
            links,
            reward,
            exhausted: charge.exhausted,
            storage_key,
        })
    }

    // Removes the stored body of a page, returning the key that still holds
    // it, if any.
    async fn discard_copy(&self, page: &FetchedPage) -> Option<String> {
        let key = page.storage_key.as_ref()?;

        let repository = match &self.collaborators.repository {
            Some(repository) => repository,
            None => return Some(key.clone()),
        };

        match repository.delete(key).await {
            Ok(()) => None,
            Err(e) => {
                log::warn!("failed to remove stored copy {} of {}: {}", key, page.link, e);
                Some(key.clone())
            }
        }
    }

    fn page_relevance(&self, page: &FetchedPage) -> Result<f64, AppError> {
        let relevance = self
            .collaborators
            .scorer
            .score(&page.text(), &self.subject)
            .map_err(|e| match e {
                AppError::Configuration(_) => e,
                other => AppError::configuration(format!("relevance scorer failed: {}", other)),
            })?;

        if !relevance.is_finite() {
            return Err(AppError::configuration(format!(
                "relevance scorer returned {} for {}",
                relevance, page.link
            )));
        }

        Ok(relevance.clamp(0.0, 1.0))
    }

    fn record(
        &mut self,
        candidate: &Candidate,
        context: &Context,
        decision: Option<&Decision>,
        action: Action,
        reward: f64,
        outcome: Outcome,
    ) {
        self.log.push(DecisionRecord {
            step: self.log.len(),
            timestamp: Utc::now(),
            link: candidate.link.clone(),
            context: context.features().to_vec(),
            action,
            reward,
            cumulative_bytes: self.frontier.charged(),
            arm_id: decision.map(|d| d.arm_id),
            arm_name: decision.map(|d| d.arm_name.clone()),
            estimate: decision.map(|d| d.estimate),
            explored: decision.map(|d| d.explored).unwrap_or(false),
            outcome,
        });
    }

    fn transition(&mut self, state: CrawlState) -> CrawlState {
        if self.state != state {
            log::info!(
                "{:?} -> {:?} after {} decisions, {} bytes",
                self.state,
                state,
                self.decisions,
                self.frontier.charged()
            );
            self.state = state;
        }

        self.state
    }

    fn finish(&mut self, reason: StopReason) -> CrawlState {
        self.transition(CrawlState::Done(reason))
    }
}
