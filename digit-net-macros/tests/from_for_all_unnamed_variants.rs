use std::num::ParseIntError;

use digit_net_macros::FromForAllUnnamedVariants;

#[derive(Debug, FromForAllUnnamedVariants)]
enum ReadError {
    Io(std::io::Error),
    Parse(ParseIntError),
    Empty,
    OutOfRange { value: i64 },
}

fn parse_label(text: &str) -> Result<i64, ReadError> {
    if text.is_empty() {
        return Err(ReadError::Empty);
    }

    let value: i64 = text.parse()?;
    if !(0..10).contains(&value) {
        return Err(ReadError::OutOfRange { value });
    }

    Ok(value)
}

#[test]
fn should_convert_wrapped_errors_with_the_question_mark() {
    assert!(matches!(parse_label("seven"), Err(ReadError::Parse(_))));
    assert!(matches!(parse_label(""), Err(ReadError::Empty)));
    assert!(matches!(
        parse_label("12"),
        Err(ReadError::OutOfRange { value: 12 })
    ));
    assert_eq!(parse_label("7").unwrap(), 7);
}

#[test]
fn should_implement_from_for_every_single_field_tuple_variant() {
    let io: ReadError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();

    assert!(matches!(io, ReadError::Io(_)));
}

#[derive(Debug, FromForAllUnnamedVariants)]
enum Borrowed<'a> {
    Text(&'a str),
    Bytes(&'a [u8]),
}

#[test]
fn should_keep_the_generics_of_the_enum() {
    let text: Borrowed = "digit".into();
    let raw: &[u8] = &[1, 2, 3];
    let bytes: Borrowed = raw.into();

    assert!(matches!(text, Borrowed::Text("digit")));
    assert!(matches!(bytes, Borrowed::Bytes(&[1, 2, 3])));
}
