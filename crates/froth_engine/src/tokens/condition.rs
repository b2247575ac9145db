//! `condition` — if/elseif/else branching over sandboxed expressions.

use crate::error::{EngineError, EngineResult};
use crate::tokens::{RenderContext, Stage, Token, TokenOutput};
use crate::xml::{Element, XmlNode};

pub const NAME: &str = "condition";
pub const PRIORITY: i32 = 2;

pub fn create(element: Element) -> Box<dyn Token> {
    Box::new(ConditionToken {
        element,
        branches: Vec::new(),
        fallback: None,
    })
}

/// Evaluates each branch condition in order and splices the children
/// of the first true branch; the `else` children when none is true;
/// nothing at all when there is no `else` either.
///
/// Runs after data population so branch expressions see substituted
/// values.
pub struct ConditionToken {
    element: Element,
    branches: Vec<(String, Vec<XmlNode>)>,
    fallback: Option<Vec<XmlNode>>,
}

impl Token for ConditionToken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn stage(&self) -> Stage {
        Stage::PostParse
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn parse(&mut self) -> EngineResult<()> {
        if !self.element.attributes.is_empty() {
            return Err(EngineError::UnexpectedToken(
                "\"b:condition\" takes no attributes".to_string(),
            ));
        }

        let mut if_found = false;
        for child in &self.element.children {
            let branch = match child {
                XmlNode::Element(e) => e,
                // Whitespace between branches is fine.
                XmlNode::Text(t) if t.trim().is_empty() => continue,
                XmlNode::Comment(_) => continue,
                XmlNode::Text(_) => {
                    return Err(EngineError::UnexpectedToken(
                        "only \"if\", \"elseif\" and \"else\" may appear in \"b:condition\""
                            .to_string(),
                    ))
                }
            };

            match branch.name.as_str() {
                "if" | "elseif" => {
                    if self.fallback.is_some() {
                        return Err(EngineError::UnexpectedToken(
                            "found an if/elseif branch after the else branch".to_string(),
                        ));
                    }
                    if branch.name == "if" {
                        if if_found {
                            return Err(EngineError::UnexpectedToken(
                                "\"b:condition\" must have exactly one if branch".to_string(),
                            ));
                        }
                        if_found = true;
                    } else if !if_found {
                        return Err(EngineError::UnexpectedToken(
                            "found an elseif branch before the if branch".to_string(),
                        ));
                    }

                    for (attr, _) in &branch.attributes {
                        if attr != "condition" {
                            return Err(EngineError::UnexpectedToken(format!(
                                "only the \"condition\" attribute is allowed on \"{}\"",
                                branch.name
                            )));
                        }
                    }
                    let condition = branch.attr("condition").ok_or_else(|| {
                        EngineError::ElementNotFound(format!(
                            "the \"condition\" attribute is required on \"{}\"",
                            branch.name
                        ))
                    })?;
                    self.branches
                        .push((condition.to_string(), branch.children.clone()));
                }
                "else" => {
                    if !branch.attributes.is_empty() {
                        return Err(EngineError::UnexpectedToken(
                            "the else branch takes no attributes".to_string(),
                        ));
                    }
                    if !if_found {
                        return Err(EngineError::UnexpectedToken(
                            "found an else branch before the if branch".to_string(),
                        ));
                    }
                    if self.fallback.is_some() {
                        return Err(EngineError::UnexpectedToken(
                            "\"b:condition\" must have at most one else branch".to_string(),
                        ));
                    }
                    self.fallback = Some(branch.children.clone());
                }
                other => {
                    return Err(EngineError::UnexpectedToken(format!(
                        "unexpected \"{other}\" element in \"b:condition\""
                    )))
                }
            }
        }

        if !if_found {
            return Err(EngineError::ElementNotFound(
                "\"b:condition\" must have an if branch".to_string(),
            ));
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut RenderContext<'_>) -> EngineResult<TokenOutput> {
        for (condition, children) in &self.branches {
            if ctx.evaluate(condition)?.is_truthy() {
                return Ok(TokenOutput::Splice(children.clone()));
            }
        }
        match self.fallback.take() {
            Some(children) => Ok(TokenOutput::Splice(children)),
            None => Ok(TokenOutput::Remove),
        }
    }
}
