//! Scanner for `\label{...}` and `\tag{...}` in display math.
//!
//! `latex2mathml` knows neither command, so both are lifted out of the
//! source before conversion and handled by the MathML renderer.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, multispace0},
    combinator::{map, opt},
    sequence::{delimited, preceded, tuple},
    IResult,
};

/// An explicit equation tag.
#[derive(Debug, Clone, PartialEq)]
pub struct EquationTag<'a> {
    pub text: &'a str,
    /// `\tag*{...}`: rendered without parentheses.
    pub starred: bool,
}

/// Display math with its labels and tag lifted out.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotated<'a> {
    pub body: String,
    pub labels: Vec<&'a str>,
    pub tag: Option<EquationTag<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Annotation<'a> {
    Label(&'a str),
    Tag(EquationTag<'a>),
}

fn braced(input: &str) -> IResult<&str, &str> {
    delimited(char('{'), take_until("}"), char('}'))(input)
}

fn label(input: &str) -> IResult<&str, Annotation<'_>> {
    map(preceded(tag("\\label"), preceded(multispace0, braced)), |name: &str| {
        Annotation::Label(name.trim())
    })(input)
}

fn equation_tag(input: &str) -> IResult<&str, Annotation<'_>> {
    map(
        tuple((tag("\\tag"), opt(char('*')), preceded(multispace0, braced))),
        |(_, star, text): (&str, Option<char>, &str)| {
            Annotation::Tag(EquationTag {
                text: text.trim(),
                starred: star.is_some(),
            })
        },
    )(input)
}

fn annotation(input: &str) -> IResult<&str, Annotation<'_>> {
    alt((label, equation_tag))(input)
}

/// Lift every `\label` and the last `\tag` out of `tex`.
pub fn annotate(tex: &str) -> Annotated<'_> {
    let mut body = String::with_capacity(tex.len());
    let mut labels = Vec::new();
    let mut equation_tag = None;
    let mut rest = tex;

    while let Some(pos) = rest.find('\\') {
        body.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Ok((remaining, found)) = annotation(rest) {
            match found {
                Annotation::Label(name) => labels.push(name),
                Annotation::Tag(t) => equation_tag = Some(t),
            }
            rest = remaining;
            continue;
        }

        // Copy the backslash and the character it escapes, so `\\label`
        // stays a line break followed by text.
        let escaped_len = rest[1..].chars().next().map_or(0, char::len_utf8);
        body.push_str(&rest[..1 + escaped_len]);
        rest = &rest[1 + escaped_len..];
    }
    body.push_str(rest);

    Annotated {
        body,
        labels,
        tag: equation_tag,
    }
}
