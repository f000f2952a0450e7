//! Built-in markup macros
//!
//! The dictionary vocabulary maps TeX-style macros onto custom HTML tags so
//! that formatting stays separate from data:
//!
//! | Macro                         | Output                                   |
//! |-------------------------------|------------------------------------------|
//! | `\pf`, `\s`, `\w`             | `<uf-pf>`, `<uf-s>`, `<uf-w>`            |
//! | `\textit`, `\textbf`          | `<em>`, `<strong>`                       |
//! | `\textnf`, `\senseref`        | `<uf-nf>`, `<uf-sense>`                  |
//! | `\Sup`, `\Sub`                | `<sup>`, `<sub>`                         |
//! | `\par`                        | paragraph break                          |
//! | `\ldots`                      | `…`                                      |
//! | `\L`, `\N`                    | mutation markers                         |
//! | `\this`                       | the current headword                     |
//! | `\ipa`                        | phonetic transform of the argument       |
//! | `\ref`, `\label`              | argument dropped                         |
//! | `\ex`, `\comment`             | nothing outside the definition part      |

use crate::expand::{ExpandResult, MacroCall};
use crate::hooks::PHONETIC_TAG;
use crate::node::OutputNode;
use crate::registry::{MacroHandler, MacroRegistryBuilder};

/// Single-argument macros rendered as a pair of tags
const TAG_MACROS: &[(&str, &str)] = &[
    ("pf", "uf-pf"),
    ("s", "uf-s"),
    ("w", "uf-w"),
    ("textit", "em"),
    ("textbf", "strong"),
    ("textnf", "uf-nf"),
    ("senseref", "uf-sense"),
    ("Sup", "sup"),
    ("Sub", "sub"),
];

/// Register the built-in vocabulary
pub fn register_builtins(builder: &mut MacroRegistryBuilder) {
    for (name, tag) in TAG_MACROS {
        builder.register(*name, TemplateMacro::tag(tag));
    }

    builder
        .register("par", SymbolMacro::new("</p><p>"))
        .register("ldots", SymbolMacro::new("…").dropping_argument())
        .register("L", SymbolMacro::new("<uf-mut><sup>L</sup></uf-mut>").dropping_argument())
        .register("N", SymbolMacro::new("<uf-mut><sup>N</sup></uf-mut>").dropping_argument())
        .register("this", CurrentHeadword)
        .register("ipa", PhoneticMacro)
        .register("ref", DropArguments)
        .register("label", DropArguments)
        .register("ex", Ignore)
        .register("comment", Ignore);
}

/// Wrap a fixed number of arguments between two literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMacro {
    open: String,
    close: String,
    arity: Option<usize>,
}

impl TemplateMacro {
    /// `arity: None` consumes every argument present
    pub fn new(open: impl Into<String>, close: impl Into<String>, arity: Option<usize>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            arity,
        }
    }

    /// `<tag>arg</tag>`
    pub fn tag(tag: &str) -> Self {
        Self::new(format!("<{tag}>"), format!("</{tag}>"), Some(1))
    }
}

impl MacroHandler for TemplateMacro {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();

        let mut nodes = vec![call.raw(self.open.as_str())];
        match self.arity {
            Some(arity) => {
                for _ in 0..arity {
                    nodes.push(call.parse_argument()?);
                }
            }
            None => {
                while call.has_argument() {
                    nodes.push(call.parse_argument()?);
                }
            }
        }
        nodes.push(call.raw(self.close.as_str()));

        Ok(vec![call.group(nodes)])
    }
}

/// Fixed text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMacro {
    text: String,
    drops_argument: bool,
}

impl SymbolMacro {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            drops_argument: false,
        }
    }

    /// Discard one argument if the invocation has one
    pub fn dropping_argument(mut self) -> Self {
        self.drops_argument = true;
        self
    }
}

impl MacroHandler for SymbolMacro {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();
        if self.drops_argument && call.has_argument() {
            call.parse_argument()?;
        }
        Ok(vec![call.raw(self.text.as_str())])
    }
}

/// `\this`: the headword of the entry being expanded
struct CurrentHeadword;

impl MacroHandler for CurrentHeadword {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();
        if call.has_argument() {
            call.parse_argument()?;
        }

        let Some(headword) = call.headword() else {
            return Err(call.error("'\\this' is not allowed here"));
        };
        let word = call.raw(headword);
        Ok(vec![call.group([call.raw("<uf-w>"), word, call.raw("</uf-w>")])])
    }
}

/// `\ipa{…}`
struct PhoneticMacro;

impl MacroHandler for PhoneticMacro {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        let argument = call.parse_argument()?;
        Ok(vec![call.transform(PHONETIC_TAG, argument)?])
    }
}

struct DropArguments;

impl MacroHandler for DropArguments {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();
        while call.has_argument() {
            call.parse_argument()?;
        }
        Ok(Vec::new())
    }
}

struct Ignore;

impl MacroHandler for Ignore {
    fn expand(&self, call: &mut MacroCall<'_>) -> ExpandResult<Vec<OutputNode>> {
        call.consume_marker();
        Ok(Vec::new())
    }
}
