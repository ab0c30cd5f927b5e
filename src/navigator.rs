// File: src/navigator.rs
use crate::core::cluster::ClusterQueue;
use crate::core::types::{WordCluster, WordType};
use crate::error::{Result, SpellerError};

/// What the operator typed at the word-set menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueChoice {
    Pick(usize),
    Next,
    Previous,
    Jump,
    EnterWord,
    Quit,
    Redisplay,
}

impl QueueChoice {
    pub fn parse(input: &str) -> Result<Self> {
        match input.trim() {
            "" => Ok(QueueChoice::Redisplay),
            "n" => Ok(QueueChoice::Next),
            "b" => Ok(QueueChoice::Previous),
            "j" => Ok(QueueChoice::Jump),
            "e" => Ok(QueueChoice::EnterWord),
            "q" => Ok(QueueChoice::Quit),
            s => s
                .parse()
                .map(QueueChoice::Pick)
                .map_err(|_| SpellerError::InputParse(s.to_string())),
        }
    }
}

/// Read-only cursor over the review queue.
#[derive(Debug, Clone)]
pub struct QueueNavigator<'q> {
    queue: &'q ClusterQueue,
    index: usize,
}

impl<'q> QueueNavigator<'q> {
    pub fn new(queue: &'q ClusterQueue) -> Self {
        Self { queue, index: 0 }
    }

    /// Zero-based index of the current word set.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn current(&self) -> Option<&'q WordCluster> {
        self.queue.get(self.index)
    }

    pub fn next(&mut self) {
        if self.index + 1 < self.queue.len() {
            self.index += 1;
        }
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Moves to the word set with 1-based `number`.
    pub fn jump(&mut self, number: usize) -> Result<()> {
        if number == 0 || number > self.queue.len() {
            return Err(SpellerError::InputParse(number.to_string()));
        }
        self.index = number - 1;
        Ok(())
    }

    /// The `k`-th member of the current word set.
    pub fn pick(&self, k: usize) -> Result<&'q WordType> {
        self.current()
            .and_then(|c| c.members().get(k))
            .ok_or_else(|| SpellerError::InputParse(k.to_string()))
    }
}
