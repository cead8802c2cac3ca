//! Line-oriented input loop and the terminal detail dialog.

use std::io::{BufRead, Write};

use anyhow::Result;
use catalog_core::{Character, CharacterDialog, CharacterId, DialogOutcome, SessionHandle};
use tokio::sync::Mutex;

use crate::render;

pub const HELP: &str = "\
commands:
  n              next page
  p              previous page
  /TEXT          search by name prefix (a bare / clears it)
  v ID           view a character (save, delete or cancel)
  r ID NAME      rename a character locally
  d ID           hide a character
  h              this help
  q              quit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Prev,
    Search(String),
    View(CharacterId),
    Rename(CharacterId, String),
    Delete(CharacterId),
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Input, String> {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(text) = line.strip_prefix('/') {
        return Ok(Input::Search(text.to_string()));
    }
    let (command, rest) = line.trim().split_once(' ').unwrap_or((line.trim(), ""));
    let rest = rest.trim();
    match command {
        "n" => Ok(Input::Next),
        "p" => Ok(Input::Prev),
        "h" | "?" => Ok(Input::Help),
        "q" => Ok(Input::Quit),
        "v" => id(rest).map(Input::View),
        "d" => id(rest).map(Input::Delete),
        "r" => {
            let (raw_id, name) = rest.split_once(' ').ok_or("usage: r ID NAME")?;
            let name = name.trim();
            if name.is_empty() {
                return Err("usage: r ID NAME".to_string());
            }
            Ok(Input::Rename(id(raw_id)?, name.to_string()))
        }
        other => Err(format!("unknown command {other:?}, type h for help")),
    }
}

fn id(raw: &str) -> Result<CharacterId, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("expected a character id, got {raw:?}"))
}

/// Prompts on `output` and reads the choice from `input`.
pub struct PromptDialog<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> PromptDialog<'a, R, W> {
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, character: &Character) -> std::io::Result<DialogOutcome> {
        write!(self.output, "{}", render::detail(character))?;
        write!(self.output, "[s]ave [NAME], [d]elete, [c]ancel: ")?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(DialogOutcome::Cancel);
        }
        let answer = answer.trim();
        let (choice, name) = answer.split_once(' ').unwrap_or((answer, ""));
        let outcome = match choice {
            "s" | "save" if name.trim().is_empty() => DialogOutcome::Save(character.name.clone()),
            "s" | "save" => DialogOutcome::Save(name.trim().to_string()),
            "d" | "delete" => DialogOutcome::Delete,
            _ => DialogOutcome::Cancel,
        };
        Ok(outcome)
    }
}

impl<R: BufRead, W: Write> CharacterDialog for PromptDialog<'_, R, W> {
    fn present(&mut self, character: &Character) -> DialogOutcome {
        self.ask(character).unwrap_or(DialogOutcome::Cancel)
    }
}

/// Keeps `terminal` locked while the inner dialog is open.
pub struct Exclusive<'a, D> {
    terminal: &'a Mutex<()>,
    dialog: D,
}

impl<'a, D: CharacterDialog> Exclusive<'a, D> {
    pub fn new(terminal: &'a Mutex<()>, dialog: D) -> Self {
        Self { terminal, dialog }
    }
}

impl<D: CharacterDialog> CharacterDialog for Exclusive<'_, D> {
    fn present(&mut self, character: &Character) -> DialogOutcome {
        let _held = self.terminal.blocking_lock();
        self.dialog.present(character)
    }
}

/// Read commands until `q` or end of input, forwarding them to the session.
///
/// Blocks on `terminal`, so call it off the async runtime.
pub fn run<R: BufRead, W: Write>(
    handle: &SessionHandle,
    terminal: &Mutex<()>,
    mut input: R,
    mut output: W,
) -> Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }
        match parse(&line) {
            Ok(Input::Quit) => return Ok(()),
            Ok(Input::Help) => write!(output, "{HELP}")?,
            Ok(Input::Next) => handle.next_page()?,
            Ok(Input::Prev) => handle.prev_page()?,
            Ok(Input::Search(text)) => handle.search(text)?,
            Ok(Input::Rename(id, name)) => handle.rename(id, name)?,
            Ok(Input::Delete(id)) => handle.delete(id)?,
            Ok(Input::View(id)) => {
                let view = handle.view();
                match view.page.characters.iter().find(|c| c.id == id) {
                    Some(character) => {
                        let dialog = PromptDialog::new(&mut input, &mut output);
                        let outcome = Exclusive::new(terminal, dialog).present(character);
                        handle.resolve(id, outcome)?;
                    }
                    None => writeln!(output, "No character {id} on this page.")?,
                }
            }
            Err(message) => writeln!(output, "{message}")?,
        }
        output.flush()?;
    }
}
