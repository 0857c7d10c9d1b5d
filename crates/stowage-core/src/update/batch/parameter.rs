use std::{cell::RefCell, fmt, rc::Rc};

///
/// ParameterNameGenerator
///
/// Hands out parameter names unique within one execution batch.
///

pub trait ParameterNameGenerator {
    fn generate_next(&mut self) -> String;

    /// Restart numbering; called whenever a new execution batch starts.
    fn reset(&mut self);
}

///
/// ParameterNameGeneratorFactory
///

pub trait ParameterNameGeneratorFactory {
    fn create(&self) -> Box<dyn ParameterNameGenerator>;
}

///
/// DefaultParameterNameGenerator
/// Produces `{prefix}0`, `{prefix}1`, ...
///

#[derive(Clone, Debug)]
pub struct DefaultParameterNameGenerator {
    prefix: String,
    next: usize,
}

impl DefaultParameterNameGenerator {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }
}

impl ParameterNameGenerator for DefaultParameterNameGenerator {
    fn generate_next(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.next);
        self.next += 1;

        name
    }

    fn reset(&mut self) {
        self.next = 0;
    }
}

///
/// DefaultParameterNameGeneratorFactory
///

#[derive(Clone, Debug)]
pub struct DefaultParameterNameGeneratorFactory {
    prefix: String,
}

impl DefaultParameterNameGeneratorFactory {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ParameterNameGeneratorFactory for DefaultParameterNameGeneratorFactory {
    fn create(&self) -> Box<dyn ParameterNameGenerator> {
        Box::new(DefaultParameterNameGenerator::new(self.prefix.clone()))
    }
}

///
/// ParameterNames
///
/// Shared handle to the generator of one `batch_commands` pass. Every
/// command of the pass holds a clone; the packer resets it when it starts a
/// new execution batch.
///

#[derive(Clone)]
pub struct ParameterNames(Rc<RefCell<Box<dyn ParameterNameGenerator>>>);

impl ParameterNames {
    #[must_use]
    pub fn new(generator: Box<dyn ParameterNameGenerator>) -> Self {
        Self(Rc::new(RefCell::new(generator)))
    }

    #[must_use]
    pub fn generate_next(&self) -> String {
        self.0.borrow_mut().generate_next()
    }

    pub fn reset(&self) {
        self.0.borrow_mut().reset();
    }
}

impl fmt::Debug for ParameterNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterNames").finish_non_exhaustive()
    }
}
