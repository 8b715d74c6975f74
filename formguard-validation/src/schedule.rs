// Rule ordering

use crate::RuleSpec;

/// Order a field's rules for execution.
///
/// Callbacks and callables keep their relative order and run first. Then
/// comes a single `required`, or a single `isset` when no `required` is
/// present. Everything else follows in its original order.
pub fn schedule(rules: &[RuleSpec]) -> Vec<RuleSpec> {
    let mut callbacks = Vec::new();
    let mut remainder = Vec::new();
    let mut required = None;
    let mut isset = None;

    for rule in rules {
        if rule.is_callback() {
            callbacks.push(rule.clone());
        } else if rule.is_bare("required") {
            required.get_or_insert_with(|| rule.clone());
        } else if rule.is_bare("isset") {
            isset.get_or_insert_with(|| rule.clone());
        } else {
            remainder.push(rule.clone());
        }
    }

    let mut ordered = callbacks;
    ordered.extend(required.or(isset));
    ordered.extend(remainder);
    ordered
}
