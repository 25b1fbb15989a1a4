//! Initialization options for a form.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use formstate_model::Access;
use formstate_validate::Suite;
use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;

use crate::config::FormConfig;
use crate::input::InputLocator;
use crate::submit::Submission;

/// A configured submit action.
pub type Action<A> = Rc<dyn Fn(Submission<A>) -> LocalBoxFuture<'static, anyhow::Result<()>>>;

/// Everything a form is created (or reset) with. Only the suite is required.
pub struct FormOptions<A: Access> {
    pub(crate) suite: Suite<A>,
    pub(crate) values: A::Values,
    pub(crate) input: InputLocator<A::Field>,
    pub(crate) action: Option<Action<A>>,
    pub(crate) touched: Vec<A::Field>,
    pub(crate) visited: Vec<A::Field>,
    pub(crate) config: FormConfig,
}

impl<A: Access> FormOptions<A>
where
    A::Values: Default,
{
    /// Options with empty values.
    pub fn new(suite: Suite<A>) -> Self {
        Self::with_values(suite, Default::default())
    }
}

impl<A: Access> FormOptions<A> {
    pub fn with_values(suite: Suite<A>, values: A::Values) -> Self {
        Self {
            suite,
            values,
            input: InputLocator::None,
            action: None,
            touched: Vec::new(),
            visited: Vec::new(),
            config: FormConfig::default(),
        }
    }

    #[must_use]
    pub fn values(mut self, values: A::Values) -> Self {
        self.values = values;
        self
    }

    #[must_use]
    pub fn input(mut self, input: InputLocator<A::Field>) -> Self {
        self.input = input;
        self
    }

    /// Action run by [`Form::submit`](crate::Form::submit).
    #[must_use]
    pub fn action<Fut>(mut self, action: impl Fn(Submission<A>) -> Fut + 'static) -> Self
    where
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.action = Some(Rc::new(move |submission| action(submission).boxed_local()));
        self
    }

    /// Fields that start out touched.
    #[must_use]
    pub fn touched<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<A::Field>,
    {
        self.touched = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Fields that start out visited.
    #[must_use]
    pub fn visited<I, T>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<A::Field>,
    {
        self.visited = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }
}

impl<A: Access> fmt::Debug for FormOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOptions")
            .field("suite", &self.suite)
            .field("input", &self.input)
            .field("action", &self.action.is_some())
            .field("touched", &self.touched)
            .field("visited", &self.visited)
            .field("config", &self.config)
            .finish()
    }
}
