/*!
 * Policy Documents
 * Build policy trees, symbols and policy updates from JSON
 */

use super::errors::{AtPath, DocumentError, DocumentResult};
use super::schema::{
    PolicyDocument, RawAlgorithm, RawCommand, RawEvaluable, RawExpression, RawMapper, RawObligation,
};
use super::value::to_value;
use crate::expr::{
    AllOf, AnyOf, AttributeAssignmentExpression, BuildError, Expression, Function, Match, Selector,
    Target,
};
use crate::policy::{
    Algorithm, Combiner, Evaluable, Mapper, MapperOrder, Policy, PolicySet, Rule, RuleEffect,
    MAPPER_NAME,
};
use crate::storage::{Command, PolicyStorage, PolicyUpdate};
use crate::value::{Attribute, FlagsType, Symbols};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Parse a complete policy document
///
/// `tag` overrides the tag written in the document.
pub fn parse_policy(data: &[u8], tag: Option<Uuid>) -> DocumentResult<PolicyStorage> {
    let doc: PolicyDocument = serde_json::from_slice(data)?;
    let symbols = build_symbols(&doc)?;
    let root = PolicyBuilder::new(&symbols).evaluable(&doc.policies, "policies")?;
    let tag = tag.or(doc.tag);
    debug!(
        attributes = symbols.len(),
        tag = ?tag,
        "Parsed policy document"
    );
    Ok(PolicyStorage::new(root, symbols, tag))
}

/// Parse a list of policy update commands against the live declarations
pub fn parse_policy_update(
    data: &[u8],
    from_tag: Uuid,
    to_tag: Uuid,
    symbols: &Symbols,
) -> DocumentResult<PolicyUpdate> {
    let commands: Vec<RawCommand<RawEvaluable>> = serde_json::from_slice(data)?;
    let builder = PolicyBuilder::new(symbols);

    let mut update = PolicyUpdate::new(from_tag, to_tag);
    for (i, raw) in commands.into_iter().enumerate() {
        let path = format!("commands/{i}");
        let entity = match &raw.entity {
            Some(entity) => Some(builder.evaluable(entity, &path)?),
            None => None,
        };
        update.append(Command {
            op: raw.op,
            path: raw.path,
            entity,
        });
    }
    Ok(update)
}

fn build_symbols(doc: &PolicyDocument) -> DocumentResult<Symbols> {
    let mut symbols = Symbols::new();
    for (name, flags) in &doc.flags {
        let path = format!("flags/{name}");
        let ty = FlagsType::new(name.clone(), flags.iter().cloned()).at(&path)?;
        symbols.put_flags_type(ty).at(&path)?;
    }
    for (id, ty) in &doc.attributes {
        let path = format!("attributes/{id}");
        let ty = symbols.resolve_type(ty).at(&path)?;
        symbols.put_attribute(Attribute::new(id.clone(), ty)).at(&path)?;
    }
    Ok(symbols)
}

/// Builds engine types from raw document nodes against a declaration table
pub(super) struct PolicyBuilder<'a> {
    symbols: &'a Symbols,
}

impl<'a> PolicyBuilder<'a> {
    pub(super) fn new(symbols: &'a Symbols) -> Self {
        Self { symbols }
    }

    pub(super) fn evaluable(&self, raw: &RawEvaluable, parent: &str) -> DocumentResult<Evaluable> {
        let path = node_path(parent, raw);
        match (raw.effect.is_some(), raw.rules.is_some(), raw.policies.is_some()) {
            (true, false, false) => self.rule(raw, &path).map(Evaluable::from),
            (false, true, false) => self.policy(raw, &path).map(Evaluable::from),
            (false, false, true) => self.policy_set(raw, &path).map(Evaluable::from),
            _ => Err(DocumentError::AmbiguousEvaluable { path }),
        }
    }

    fn rule(&self, raw: &RawEvaluable, path: &str) -> DocumentResult<Rule> {
        reject(raw.alg.is_some(), path, "alg", "rule")?;
        reject(raw.rules.is_some(), path, "rules", "rule")?;
        reject(raw.policies.is_some(), path, "policies", "rule")?;

        let effect = match &raw.effect {
            Some(effect) => effect.parse::<RuleEffect>().at(path)?,
            None => return Err(DocumentError::AmbiguousEvaluable { path: path.to_string() }),
        };
        let condition = match &raw.condition {
            Some(condition) => Some(self.expression(condition, &format!("{path}/condition"))?),
            None => None,
        };

        Rule::new(
            raw.id.clone(),
            self.target(&raw.target, path)?,
            condition,
            effect,
            self.obligations(&raw.obligations, path)?,
        )
        .at(path)
    }

    fn policy(&self, raw: &RawEvaluable, path: &str) -> DocumentResult<Policy> {
        reject(raw.condition.is_some(), path, "condition", "policy")?;

        let rules_path = format!("{path}/rules");
        let rules = raw
            .rules
            .iter()
            .flatten()
            .map(|rule| {
                let rule_path = node_path(&rules_path, rule);
                self.rule(rule, &rule_path).map(Arc::new)
            })
            .collect::<DocumentResult<Vec<_>>>()?;

        Policy::new(
            raw.id.clone(),
            self.target(&raw.target, path)?,
            rules,
            self.algorithm(raw.alg.as_ref(), path)?,
            self.obligations(&raw.obligations, path)?,
        )
        .at(path)
    }

    fn policy_set(&self, raw: &RawEvaluable, path: &str) -> DocumentResult<PolicySet> {
        reject(raw.condition.is_some(), path, "condition", "policy set")?;

        let children_path = format!("{path}/policies");
        let children = raw
            .policies
            .iter()
            .flatten()
            .map(|child| self.evaluable(child, &children_path).map(Arc::new))
            .collect::<DocumentResult<Vec<_>>>()?;

        PolicySet::new(
            raw.id.clone(),
            self.target(&raw.target, path)?,
            children,
            self.algorithm(raw.alg.as_ref(), path)?,
            self.obligations(&raw.obligations, path)?,
        )
        .at(path)
    }

    fn target(&self, raw: &[Vec<Vec<RawExpression>>], path: &str) -> DocumentResult<Target> {
        let path = format!("{path}/target");
        let any = raw
            .iter()
            .map(|all| {
                let all = all
                    .iter()
                    .map(|matches| {
                        let matches = matches
                            .iter()
                            .map(|m| self.matcher(m, &path))
                            .collect::<DocumentResult<Vec<_>>>()?;
                        Ok(AllOf::new(matches))
                    })
                    .collect::<DocumentResult<Vec<_>>>()?;
                Ok(AnyOf::new(all))
            })
            .collect::<DocumentResult<Vec<_>>>()?;
        Ok(Target::new(any))
    }

    fn matcher(&self, raw: &RawExpression, path: &str) -> DocumentResult<Match> {
        match raw {
            RawExpression::Call(call) => {
                let args = self.expressions(&call.args, path)?;
                let function = Function::new(&call.name, args).at(path)?;
                Match::new(function).at(path)
            }
            _ => Err(BuildError::InvalidMatch("a match must be a function call".into())).at(path),
        }
    }

    fn algorithm(&self, raw: Option<&RawAlgorithm>, path: &str) -> DocumentResult<Algorithm> {
        let path = format!("{path}/alg");
        match raw {
            None => Ok(Combiner::FirstApplicableEffect.into()),
            Some(RawAlgorithm::Name(name)) => self.combiner(name, &path).map(Algorithm::from),
            Some(RawAlgorithm::Mapper(mapper)) => self.mapper(mapper, &path).map(Algorithm::from),
        }
    }

    fn combiner(&self, name: &str, path: &str) -> DocumentResult<Combiner> {
        if name.eq_ignore_ascii_case(MAPPER_NAME) {
            return Err(DocumentError::Shape {
                path: path.to_string(),
                expected: "a mapper object with \"map\"".into(),
                found: "string",
            });
        }
        name.parse::<Combiner>().at(path)
    }

    fn mapper(&self, raw: &RawMapper, path: &str) -> DocumentResult<Mapper> {
        if !raw.id.eq_ignore_ascii_case(MAPPER_NAME) {
            return Err(BuildError::UnknownAlgorithm(raw.id.clone())).at(path);
        }

        let argument = self.expression(&raw.map, &format!("{path}/map"))?;
        let order = match &raw.order {
            Some(order) => order.parse::<MapperOrder>().at(path)?,
            None => MapperOrder::default(),
        };
        let sub = match raw.alg.as_deref() {
            None => None,
            Some(RawAlgorithm::Mapper(_)) => return Err(BuildError::NestedMapper).at(path),
            Some(RawAlgorithm::Name(name)) if name.eq_ignore_ascii_case(MAPPER_NAME) => {
                return Err(BuildError::NestedMapper).at(path)
            }
            Some(RawAlgorithm::Name(name)) => Some(name.parse::<Combiner>().at(path)?),
        };

        Mapper::new(argument, order, raw.default.clone(), raw.error.clone(), sub).at(path)
    }

    fn obligations(
        &self,
        raw: &[RawObligation],
        path: &str,
    ) -> DocumentResult<Vec<AttributeAssignmentExpression>> {
        raw.iter()
            .map(|obligation| {
                let path = format!("{path}/obligations/{}", obligation.id);
                let expr = self.expression(&obligation.expr, &path)?;
                let attribute = self
                    .symbols
                    .attribute(&obligation.id)
                    .cloned()
                    .unwrap_or_else(|| Attribute::new(obligation.id.clone(), expr.result_type()));
                AttributeAssignmentExpression::new(attribute, expr).at(&path)
            })
            .collect()
    }

    pub(super) fn expression(&self, raw: &RawExpression, path: &str) -> DocumentResult<Expression> {
        match raw {
            RawExpression::Attr(id) => self
                .symbols
                .attribute(id)
                .cloned()
                .map(Expression::designator)
                .ok_or_else(|| BuildError::UnknownAttribute(id.clone()))
                .at(path),
            RawExpression::Val(value) => {
                let ty = self.symbols.resolve_type(&value.ty).at(path)?;
                to_value(&ty, &value.content, path).map(Expression::value)
            }
            RawExpression::Selector(selector) => {
                let ty = self.symbols.resolve_type(&selector.ty).at(path)?;
                let keys = self.expressions(&selector.path, path)?;
                Selector::new(&selector.uri, keys, ty).map(Expression::from).at(path)
            }
            RawExpression::Call(call) => {
                let args = self.expressions(&call.args, path)?;
                Function::new(&call.name, args).map(Expression::from).at(path)
            }
        }
    }

    fn expressions(&self, raw: &[RawExpression], path: &str) -> DocumentResult<Vec<Expression>> {
        raw.iter().map(|expr| self.expression(expr, path)).collect()
    }
}

fn node_path(parent: &str, raw: &RawEvaluable) -> String {
    match &raw.id {
        Some(id) => format!("{parent}/{id}"),
        None => format!("{parent}/<hidden>"),
    }
}

fn reject(present: bool, path: &str, field: &'static str, kind: &'static str) -> DocumentResult<()> {
    if present {
        Err(DocumentError::UnexpectedField {
            path: path.to_string(),
            field,
            kind,
        })
    } else {
        Ok(())
    }
}
