use crate::error::XamldocError;

/// Lexical decoding of a compact argument type token such as `InArgument(x:String)`.
///
/// The direction is passed through verbatim; deciding whether it is a legal direction
/// belongs to [`crate::model::Argument::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub direction: String,
    pub type_name: String,
}

/// Decodes `<Direction>(<prefix>:<TypeName>)` into its direction and type name.
///
/// The namespace prefix is discarded. The type name ends at the token's last `)`, not
/// the first one, so nested generic types keep their own parentheses:
/// `InArgument(scg:List(x:String))` decodes to `("InArgument", "List(x:String)")`
/// rather than the truncated `"List(x:String"`.
pub fn parse_type_descriptor(token: &str) -> Result<TypeDescriptor, XamldocError> {
    if token.trim().is_empty() {
        return Err(XamldocError::Usage(
            "type descriptor must not be empty".into(),
        ));
    }

    let open = token
        .find('(')
        .ok_or_else(|| malformed(token, "missing '('"))?;
    let colon = token[open..]
        .find(':')
        .map(|offset| open + offset)
        .ok_or_else(|| malformed(token, "missing ':' after '('"))?;
    let close = token
        .rfind(')')
        .filter(|close| *close > colon)
        .ok_or_else(|| malformed(token, "missing ')' after ':'"))?;

    Ok(TypeDescriptor {
        direction: token[..open].to_string(),
        type_name: token[colon + 1..close].to_string(),
    })
}

fn malformed(token: &str, reason: &str) -> XamldocError {
    XamldocError::MalformedDescriptor {
        token: token.to_string(),
        reason: reason.to_string(),
    }
}
