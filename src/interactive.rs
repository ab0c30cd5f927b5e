// File: src/interactive.rs
use crate::config::SpellerConfig;
use crate::core::types::{Occurrence, WordCluster};
use crate::core::Analysis;
use crate::corpus::CorpusAccessor;
use crate::decision_log::LogSink;
use crate::error::{Result, SpellerError};
use crate::navigator::{QueueChoice, QueueNavigator};
use crate::session::{ReviewSession, SessionChoice, SessionCommand, Step};
use crossterm::style::Stylize;
use std::fmt::Display;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const RULE: &str = "=========================================================================================================";

fn terminal_error(e: std::io::Error) -> SpellerError {
    SpellerError::io("<terminal>", e)
}

/// Line-oriented operator console.
pub struct Console<R, W> {
    input: R,
    output: W,
    color: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W, color: bool) -> Self {
        Self { input, output, color }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn say(&mut self, text: impl Display) -> Result<()> {
        writeln!(self.output, "{text}").map_err(terminal_error)
    }

    /// Prompts and reads one line; `None` once input is exhausted.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}").map_err(terminal_error)?;
        self.output.flush().map_err(terminal_error)?;
        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(terminal_error)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn reject(&mut self, err: &SpellerError) -> Result<()> {
        self.say(format!("{err}. Please try again."))
    }

    fn banner(&mut self) -> Result<()> {
        self.say(format!("\n{RULE}\n{RULE}\n"))
    }

    fn emphasise(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Rebuilds `sentence` with the `instance`-th token equal to `word` highlighted.
pub fn highlight(sentence: &str, word: &str, instance: usize, emphasise: impl Fn(&str) -> String) -> String {
    let mut seen = 0usize;
    sentence
        .split_whitespace()
        .map(|tok| {
            if tok != word {
                return tok.to_string();
            }
            seen += 1;
            if seen - 1 == instance {
                emphasise(tok)
            } else {
                tok.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The interactive front end: word-set menu plus one review session per chosen word.
pub struct Speller<'a> {
    corpus: &'a dyn CorpusAccessor,
    config: &'a SpellerConfig,
    analysis: &'a Analysis,
}

impl<'a> Speller<'a> {
    pub fn new(corpus: &'a dyn CorpusAccessor, config: &'a SpellerConfig, analysis: &'a Analysis) -> Self {
        Self { corpus, config, analysis }
    }

    pub fn run_menu<R: BufRead, W: Write>(&self, console: &mut Console<R, W>, log: &mut dyn LogSink) -> Result<()> {
        let mut nav = QueueNavigator::new(&self.analysis.queue);
        if nav.is_empty() {
            console.say("There are no word types to review.")?;
            return Ok(());
        }

        loop {
            let Some(cluster) = nav.current() else { return Ok(()) };
            self.print_menu(console, cluster, nav.index() + 1, nav.len())?;
            let Some(response) = console.ask("Enter your choice: ")? else { return Ok(()) };

            let choice = match QueueChoice::parse(&response) {
                Ok(choice) => choice,
                Err(e) => {
                    console.reject(&e)?;
                    continue;
                }
            };
            match choice {
                QueueChoice::Pick(k) => match nav.pick(k) {
                    Ok(word_type) => {
                        console.say(format!("You chose {k}."))?;
                        if self.review_word(&word_type.text, console, log)? == Step::Quit {
                            console.say("Going back to the main menu.")?;
                        }
                    }
                    Err(e) => console.reject(&e)?,
                },
                QueueChoice::Next => nav.next(),
                QueueChoice::Previous => nav.previous(),
                QueueChoice::Jump => {
                    let Some(raw) = console.ask("Enter the word set number: ")? else { return Ok(()) };
                    let jumped = raw
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| SpellerError::InputParse(raw.trim().to_string()))
                        .and_then(|n| nav.jump(n));
                    if let Err(e) = jumped {
                        console.reject(&e)?;
                    }
                }
                QueueChoice::EnterWord => {
                    let Some(raw) = console.ask("Enter a word to work on: ")? else { return Ok(()) };
                    let word = raw.trim();
                    if self.analysis.vocab.contains_type(word) {
                        self.review_word(word, console, log)?;
                    } else {
                        console.say(format!(
                            "{word} is not in the vocabulary of the dataset. Please enter a word that is part of the vocabulary."
                        ))?;
                    }
                }
                QueueChoice::Redisplay => {}
                QueueChoice::Quit => return Ok(()),
            }
        }
    }

    fn print_menu<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        cluster: &WordCluster,
        number: usize,
        total: usize,
    ) -> Result<()> {
        console.banner()?;
        console.say(format!("Word set {number} of {total}\n"))?;
        let mut text = String::from("Which word do you wish to work on?\n");
        for (k, member) in cluster.members().iter().enumerate() {
            text.push_str(&format!(
                "{k:>4}: {:20} [Occurrence count:{:5};  pscore:{:5}]\n",
                member.text,
                member.count,
                member.priority()
            ));
        }
        for (key, label) in [
            ("n", "Next word set."),
            ("b", "Previous word set."),
            ("j", "Jump to a specific word set."),
            ("e", "Enter a specific word to edit."),
            ("q", "To quit the program."),
        ] {
            text.push_str(&format!("{key:>4}: {label}\n"));
        }
        console.say(text)
    }

    /// Steps through every occurrence of `word`. Returns how the session ended.
    pub fn review_word<R: BufRead, W: Write>(
        &self,
        word: &str,
        console: &mut Console<R, W>,
        log: &mut dyn LogSink,
    ) -> Result<Step> {
        log.event(&format!("Let's work on \"{word}\""))?;
        console.say(format!("Let's work on \"{word}\""))?;
        let mut session = ReviewSession::start(word, &self.analysis.vocab, self.corpus, self.config.session)?;
        if session.worklist().is_empty() {
            console.say(format!("No occurrences of \"{word}\" were found."))?;
            return Ok(Step::Finished);
        }

        let mut sentences = SentenceCache::default();
        loop {
            let Some(occ) = session.current().cloned() else { return Ok(Step::Finished) };
            let sentence = sentences.get(self.corpus, &occ)?;
            self.print_occurrence(console, &session, &occ, &sentence)?;

            let Some(response) = console.ask("Please enter your choice: ")? else {
                log.event(&format!("Quitting for \"{word}\""))?;
                return Ok(Step::Quit);
            };
            let command = match SessionChoice::parse(&response) {
                Ok(SessionChoice::Number(k)) => SessionCommand::Select(k),
                Ok(SessionChoice::Accept) => SessionCommand::Accept,
                Ok(SessionChoice::Back) => SessionCommand::Back,
                Ok(SessionChoice::Quit) => SessionCommand::Quit,
                Ok(SessionChoice::EnterCorrection) => {
                    let Some(text) = console.ask("Enter the new word and press Enter: ")? else { continue };
                    SessionCommand::Correct(text)
                }
                Ok(SessionChoice::EnterGlobal) => {
                    let Some(text) = console.ask("Enter the word to use in every file and press Enter: ")? else {
                        continue;
                    };
                    SessionCommand::Global(text)
                }
                Ok(SessionChoice::EnterNote) => {
                    let Some(text) = console.ask("Enter a note to save for this item and press Enter: ")? else {
                        continue;
                    };
                    SessionCommand::Note(text)
                }
                Err(e) => {
                    console.reject(&e)?;
                    continue;
                }
            };

            match session.apply(command, log) {
                Ok(Step::Continue) => {}
                Ok(Step::Finished) => {
                    console.say(format!("The end of the work list for \"{word}\" has been reached."))?;
                    return Ok(Step::Finished);
                }
                Ok(Step::Quit) => {
                    log.event(&format!("Quitting for \"{word}\""))?;
                    return Ok(Step::Quit);
                }
                Err(e @ SpellerError::InputParse(_)) => console.reject(&e)?,
                Err(e) => return Err(e),
            }
        }
    }

    fn print_occurrence<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        session: &ReviewSession,
        occ: &Occurrence,
        sentence: &str,
    ) -> Result<()> {
        let word = session.word();
        let file_name = occ.file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let marked = highlight(sentence, word, occ.instance, |t| console.emphasise(t));
        let heading = format!(
            "Occurrence number {} of {}\n\nFound {} in {} in the sentence:\n\n{}\n",
            occ.sequence + 1,
            session.worklist().len(),
            console.emphasise(word),
            file_name,
            marked
        );
        console.banner()?;
        console.say(heading)?;

        let mut text = String::from("Change it to:\n");
        for (k, pair) in session.matches().iter().enumerate() {
            text.push_str(&format!(
                "{k:>5}: {:20} [Occurrence count:{:5};  match ratio: {:<5.3}]\n",
                pair.word,
                self.analysis.vocab.count(&pair.word),
                pair.ratio
            ));
        }
        let global = format!("Or enter a word to replace \"{word}\" in every file.");
        for (key, label) in [
            ("e", "Or enter a new word that is not in the list above."),
            ("g", global.as_str()),
            ("l", "Or enter a note or comment for this item."),
            ("b", "Or go to previous item."),
            ("q", "Or quit and go back to main menu."),
            ("", "Pressing Enter without a choice will advance to the next occurrence."),
        ] {
            text.push_str(&format!("{key:>5}: {label}\n"));
        }
        console.say(text)
    }
}

/// Keeps the intervals of the last file read, since consecutive occurrences
/// usually come from the same file.
#[derive(Default)]
struct SentenceCache {
    file: Option<PathBuf>,
    intervals: Vec<String>,
}

impl SentenceCache {
    fn get(&mut self, corpus: &dyn CorpusAccessor, occ: &Occurrence) -> Result<String> {
        if self.file.as_deref() != Some(occ.file.as_path()) {
            self.intervals = corpus.list_intervals(&occ.file)?;
            self.file = Some(occ.file.clone());
        }
        self.intervals.get(occ.interval).cloned().ok_or_else(|| SpellerError::IntervalOutOfRange {
            path: occ.file.clone(),
            index: occ.interval,
            len: self.intervals.len(),
        })
    }
}
