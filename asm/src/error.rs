use arch::encoder::EncodeError;
use color_print::cprintln;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Expression syntax
    #[error("Syntax error: `(` is never closed")]
    UnclosedGroup,

    #[error("Syntax error: `)` without matching `(`")]
    UnopenedGroup,

    #[error("Syntax error: two operators in a row at `{0}`")]
    ConsecutiveOperators(String),

    #[error("Syntax error: two operands in a row at `{0}`")]
    ConsecutiveOperands(String),

    #[error("Syntax error: operand expected before {0}")]
    MissingOperand(String),

    #[error("Syntax error: unexpected character `{0}`")]
    UnexpectedChar(char),

    #[error("Invalid number: `{0}`")]
    InvalidNumber(String),

    #[error("Number does not fit in a word: `{0}`")]
    NumberOverflow(String),

    #[error("Register `{0}` cannot be used in an expression")]
    RegisterInExpression(String),

    // Line syntax
    #[error("Invalid label: `{0}`")]
    InvalidLabel(String),

    #[error("Empty argument")]
    EmptyArgument,

    #[error("Unterminated string: {0}")]
    UnterminatedString(String),

    // Symbols
    #[error("Already defined: `{0}`")]
    AlreadyDefined(String),

    #[error("Undefined symbol: `{0}`")]
    UndefinedSymbol(String),

    #[error("Recursive definition: {0}")]
    Recursion(String),

    // Statements
    #[error("Unknown directive: `{0}`")]
    UnknownDirective(String),

    #[error("`{0}` requires a label")]
    MissingLabel(String),

    #[error("`{0}` does not take a label")]
    UnexpectedLabel(String),

    #[error("`{0}` takes {1} argument(s), got {2}")]
    ArgumentCount(String, String, usize),

    #[error("`{0}` expects {1}")]
    ArgumentKind(String, &'static str),

    #[error("Duplicate `.ORIG`")]
    DuplicateOrig,

    #[error("`.ORIG` must come before any code")]
    OrigNotFirst,

    #[error("Start address must be a constant: `{0}`")]
    StartNotConstant(String),

    #[error("Value must be a constant: `{0}`")]
    NotConstant(String),

    // Encoding
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Too complex to encode: `{0}`")]
    TooComplex(String),

    #[error("Relocatable value `{0}` in an absolute field")]
    RelocatableImmediate(String),

    #[error("Address x{0:04X} is not on the page of x{1:04X}")]
    OffPage(u16, u16),

    #[error("Program length too complex to encode: `{0}`")]
    LengthTooComplex(String),

    #[error("Execution address too complex to encode: `{0}`")]
    ExecTooComplex(String),

    // Files
    #[error("Failed to open file: {0}")]
    FileOpen(String, #[source] std::io::Error),

    #[error("Failed to write file: {0}")]
    FileWrite(String, #[source] std::io::Error),

    #[error("Failed to serialize symbol table")]
    Dump(#[from] serde_yaml::Error),
}

impl Error {
    /// Print error with diagnostic information showing file location and line content
    pub fn print_diag(&self, file: &str, lines: &[String], line_idx: Option<usize>) {
        cprintln!("<red,bold>error</>: {}", self);
        print_location(file, lines, line_idx);
    }
}

pub(crate) fn print_location(file: &str, lines: &[String], line_idx: Option<usize>) {
    let Some(line_idx) = line_idx else {
        cprintln!("     <blue>--></> <underline>{}</>", file);
        return;
    };

    // line_idx is 0-based, display as 1-based
    let line_num = line_idx + 1;
    cprintln!("     <blue>--></> <underline>{}:{}</>", file, line_num);
    cprintln!("      <blue>|</>");

    let line_content = lines.get(line_idx).map(|s| s.as_str()).unwrap_or("");

    cprintln!(" <blue>{:>4} |</> {}", line_num, line_content);
    cprintln!("      <blue>|</>");
}
