use crate::naming::ObjectName;

/// How far a request got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Executed by the renderer as batch `seq`.
    Acknowledged {
        /// Sequence number of the batch carrying the request.
        seq: u64,
    },
    /// The request produced no commands; the channel was not touched.
    Nothing,
    /// No renderer is connected; the request was accepted and dropped.
    Dropped,
}

/// Result of a facade request: the renderer objects it created and what
/// happened to its commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Objects created, in creation order.
    pub objects: Vec<ObjectName>,
    /// Delivery status.
    pub delivery: Delivery,
}

impl Receipt {
    pub(crate) fn dropped() -> Self {
        Self {
            objects: Vec::new(),
            delivery: Delivery::Dropped,
        }
    }

    pub(crate) fn nothing() -> Self {
        Self {
            objects: Vec::new(),
            delivery: Delivery::Nothing,
        }
    }

    /// Whether the renderer confirmed execution.
    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        matches!(self.delivery, Delivery::Acknowledged { .. })
    }

    /// First object created, if any.
    #[must_use]
    pub fn object(&self) -> Option<&ObjectName> {
        self.objects.first()
    }
}
