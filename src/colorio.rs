// Copyright 2018 Peter Williams <peter@newton.cx>
// Licensed under the MIT License.

/*! Colorized CLI output.

There are a few common colorized output styles that we use. Most text goes
straight to a terminal stream, but table cells have to be styled before the
table is laid out, so `paint` renders a style into a string of ANSI escapes
instead.

*/

use failure::Error;
use std::fmt;
use std::io::{self, IsTerminal, Write};
use termcolor::{Ansi, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};


/// How to style some text to print.
///
/// Instead of using this type directly, use the `cprint!` family of macros.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Style {
    /// Style some text with a green color.
    Green,

    /// Style some text with a bold, bright color.
    Highlight,

    /// Style some text in the standard plain way.
    Plain,

    /// Style some text with a red color.
    Red,
}

impl Style {
    fn spec(&self) -> Option<ColorSpec> {
        let mut spec = ColorSpec::new();

        match *self {
            Style::Green => {
                spec.set_fg(Some(Color::Green));
            },

            Style::Highlight => {
                spec.set_bold(true);
            },

            Style::Plain => {
                return None;
            },

            Style::Red => {
                spec.set_fg(Some(Color::Red));
            },
        }

        Some(spec)
    }
}


/// Where to print some text.
///
/// Instead of using this type directly, use the `cprint!` family of macros.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stream {
    /// Print to standard error.
    Stderr,

    /// Print to standard output.
    Stdout,
}


macro_rules! cprint {
    ($cio:expr, hl, $($fmt_args:expr),*) => {{
        use $crate::colorio::{Stream, Style};
        $cio.print_core(Stream::Stdout, Style::Highlight, format_args!($($fmt_args),*))
    }};

    ($cio:expr, pl, $($fmt_args:expr),*) => {{
        use $crate::colorio::{Stream, Style};
        $cio.print_core(Stream::Stdout, Style::Plain, format_args!($($fmt_args),*))
    }};
}

macro_rules! cprintln {
    ($cio:expr, $style:ident, $($fmt_args:expr),*) => {
        cprint!($cio, $style, $($fmt_args),*);
        cprint!($cio, pl, "\n");
    };
}

macro_rules! ecprint {
    ($cio:expr, pl, $($fmt_args:expr),*) => {{
        use $crate::colorio::{Stream, Style};
        $cio.print_core(Stream::Stderr, Style::Plain, format_args!($($fmt_args),*))
    }};

    ($cio:expr, red, $($fmt_args:expr),*) => {{
        use $crate::colorio::{Stream, Style};
        $cio.print_core(Stream::Stderr, Style::Red, format_args!($($fmt_args),*))
    }};
}

macro_rules! ecprintln {
    ($cio:expr, $style:ident, $($fmt_args:expr),*) => {
        ecprint!($cio, $style, $($fmt_args),*);
        ecprint!($cio, pl, "\n");
    };
}


/// Style `text` as `style` by embedding ANSI escape sequences in it.
pub fn paint(style: Style, text: &str) -> String {
    let spec = match style.spec() {
        Some(s) => s,
        None => return text.to_owned(),
    };

    let mut ansi = Ansi::new(Vec::new());
    let _r = ansi.set_color(&spec);
    let _r = ansi.write_all(text.as_bytes());
    let _r = ansi.reset();
    String::from_utf8_lossy(&ansi.into_inner()).into_owned()
}


/// State needed for our colorized I/O.
pub struct ColorIo {
    stdout: StandardStream,
    stderr: StandardStream,
}


impl ColorIo {
    pub fn new() -> Self {
        let stdout = StandardStream::stdout(choice_for(io::stdout().is_terminal()));
        let stderr = StandardStream::stderr(choice_for(io::stderr().is_terminal()));
        ColorIo { stdout, stderr }
    }

    /// Whether text printed to standard output will carry colors.
    pub fn stdout_has_color(&self) -> bool {
        self.stdout.supports_color()
    }

    pub fn print_error(&mut self, err: Error) {
        let mut first = true;

        for cause in err.iter_chain() {
            if first {
                ecprint!(self, red, "error:");
                ecprintln!(self, pl, " {}", cause);
                first = false;
            } else {
                ecprint!(self, pl, "  ");
                ecprint!(self, red, "caused by:");
                ecprintln!(self, pl, " {}", cause);
            }
        }
    }

    /// Print formatted arguments to one of the standard streams.
    ///
    /// Use the `cprint!` macros instead of this function.
    #[inline(always)]
    pub fn print_core(&mut self, stream: Stream, style: Style, args: fmt::Arguments) {
        let stream = match stream {
            Stream::Stderr => &mut self.stderr,
            Stream::Stdout => &mut self.stdout,
        };

        let spec = style.spec();

        if let Some(ref spec) = spec {
            let _r = stream.set_color(spec);
        }

        let _r = write!(stream, "{}", args);

        if spec.is_some() {
            let _r = stream.reset();
        }
    }
}


/// Pipes and files get no escape codes; terminals get whatever the
/// environment (`TERM`, `NO_COLOR`) allows.
fn choice_for(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}
