//! Locating the UI element bound to a field.
//!
//! The host environment owns its element tree; the form only needs to find,
//! focus and blur the element for a field name.

use std::fmt;
use std::rc::Rc;

/// An input element the host can focus and blur.
pub trait InputElement {
    fn focus(&self);
    fn blur(&self);
}

/// A host element tree that resolves selector strings.
pub trait ElementTree {
    fn query_selector(&self, selector: &str) -> Option<Rc<dyn InputElement>>;
}

type FindFn<F> = Rc<dyn Fn(&F) -> Option<Rc<dyn InputElement>>>;

/// How a form finds a field's input element.
pub enum InputLocator<F> {
    /// No element lookup; every query misses.
    None,
    /// Ask a function.
    Function(FindFn<F>),
    /// Substitute the field name for every `{}` in `template` and query
    /// `tree` with the result.
    Selector {
        template: String,
        tree: Rc<dyn ElementTree>,
    },
}

impl<F> Default for InputLocator<F> {
    fn default() -> Self {
        Self::None
    }
}

impl<F> Clone for InputLocator<F> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Function(find) => Self::Function(Rc::clone(find)),
            Self::Selector { template, tree } => Self::Selector {
                template: template.clone(),
                tree: Rc::clone(tree),
            },
        }
    }
}

impl<F: fmt::Display> InputLocator<F> {
    pub fn function(find: impl Fn(&F) -> Option<Rc<dyn InputElement>> + 'static) -> Self {
        Self::Function(Rc::new(find))
    }

    pub fn selector(template: impl Into<String>, tree: Rc<dyn ElementTree>) -> Self {
        Self::Selector {
            template: template.into(),
            tree,
        }
    }

    /// The selector string for `field`, when locating by selector.
    pub fn selector_for(&self, field: &F) -> Option<String> {
        match self {
            Self::Selector { template, .. } => Some(template.replace("{}", &field.to_string())),
            _ => None,
        }
    }

    pub fn find(&self, field: &F) -> Option<Rc<dyn InputElement>> {
        match self {
            Self::None => None,
            Self::Function(find) => find(field),
            Self::Selector { tree, .. } => {
                let selector = self.selector_for(field)?;
                tree.query_selector(&selector)
            }
        }
    }
}

impl<F> fmt::Debug for InputLocator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Function(_) => f.write_str("Function"),
            Self::Selector { template, .. } => {
                f.debug_struct("Selector").field("template", template).finish()
            }
        }
    }
}
