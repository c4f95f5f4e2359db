use super::{EncryptionParameters, ParameterRegistry, ParamsError, ParmsEntry, ParmsId, SchemeType};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, instrument, warn};

/// One level of the modulus-switching chain.
#[derive(Debug)]
pub struct ContextData {
    parms: EncryptionParameters,
    parms_id: ParmsId,
    chain_index: usize,
    next_parms_id: Option<ParmsId>,
}

impl ContextData {
    pub fn parms(&self) -> &EncryptionParameters {
        &self.parms
    }

    pub fn parms_id(&self) -> ParmsId {
        self.parms_id
    }

    /// Number of levels below this one; the last level has index 0.
    pub fn chain_index(&self) -> usize {
        self.chain_index
    }

    /// The level reached by dropping this level's last prime.
    pub fn next_parms_id(&self) -> Option<ParmsId> {
        self.next_parms_id
    }
}

/// Registry of every level derived from one parameter set.
///
/// Level 0 of the chain is the key level holding all primes. Each following
/// level drops the trailing prime, down to a single prime. Data levels start
/// right below the key level, unless only one prime exists.
///
/// Invalid parameters still produce a context; it has no chain and
/// [`parameters_set`](Self::parameters_set) reports `false`.
#[derive(Debug)]
pub struct HeContext {
    params: EncryptionParameters,
    parameter_error: Option<ParamsError>,
    chain: Vec<Arc<ContextData>>,
    by_id: HashMap<ParmsId, usize>,
}

impl HeContext {
    #[instrument(skip(params), fields(degree = params.poly_modulus_degree(), primes = params.coeff_modulus().len()))]
    pub fn new(params: EncryptionParameters) -> Self {
        if let Err(err) = params.validate() {
            warn!(%err, "encryption parameters rejected");
            return Self {
                params,
                parameter_error: Some(err),
                chain: Vec::new(),
                by_id: HashMap::new(),
            };
        }

        let levels = params.coeff_modulus().len();
        let level_parms: Vec<EncryptionParameters> =
            (0..levels).map(|dropped| params.drop_last(dropped)).collect();
        let ids: Vec<ParmsId> = level_parms.iter().map(EncryptionParameters::parms_id).collect();

        let chain: Vec<Arc<ContextData>> = level_parms
            .into_iter()
            .enumerate()
            .map(|(level, parms)| {
                Arc::new(ContextData {
                    parms,
                    parms_id: ids[level],
                    chain_index: levels - 1 - level,
                    next_parms_id: ids.get(level + 1).copied(),
                })
            })
            .collect();
        let by_id = ids.iter().enumerate().map(|(level, &id)| (id, level)).collect();
        debug!(levels, "modulus chain built");

        Self {
            params,
            parameter_error: None,
            chain,
            by_id,
        }
    }

    pub fn parameters_set(&self) -> bool {
        self.parameter_error.is_none()
    }

    pub fn parameter_error(&self) -> Option<&ParamsError> {
        self.parameter_error.as_ref()
    }

    pub fn parameters(&self) -> &EncryptionParameters {
        &self.params
    }

    pub fn scheme(&self) -> SchemeType {
        self.params.scheme()
    }

    pub fn context_data(&self, parms_id: &ParmsId) -> Option<&Arc<ContextData>> {
        self.by_id.get(parms_id).map(|&level| &self.chain[level])
    }

    pub fn key_context_data(&self) -> Option<&Arc<ContextData>> {
        self.chain.first()
    }

    pub fn first_context_data(&self) -> Option<&Arc<ContextData>> {
        self.chain.get(1).or_else(|| self.chain.first())
    }

    pub fn last_context_data(&self) -> Option<&Arc<ContextData>> {
        self.chain.last()
    }

    /// Zero when the parameters are not set.
    pub fn key_parms_id(&self) -> ParmsId {
        self.key_context_data().map_or(ParmsId::ZERO, |data| data.parms_id)
    }

    /// Zero when the parameters are not set.
    pub fn first_parms_id(&self) -> ParmsId {
        self.first_context_data().map_or(ParmsId::ZERO, |data| data.parms_id)
    }

    /// Zero when the parameters are not set.
    pub fn last_parms_id(&self) -> ParmsId {
        self.last_context_data().map_or(ParmsId::ZERO, |data| data.parms_id)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Arc<ContextData>> {
        self.chain.iter()
    }
}

impl ParameterRegistry for HeContext {
    fn lookup(&self, parms_id: &ParmsId) -> Option<ParmsEntry<'_>> {
        if let Some(data) = self.context_data(parms_id) {
            return Some(ParmsEntry {
                degree: data.parms.poly_modulus_degree(),
                coeff_modulus: data.parms.coeff_modulus(),
                is_valid: true,
            });
        }
        // Rejected parameters are still reported, flagged invalid.
        (!self.parameters_set() && *parms_id == self.params.parms_id()).then(|| ParmsEntry {
            degree: self.params.poly_modulus_degree(),
            coeff_modulus: self.params.coeff_modulus(),
            is_valid: false,
        })
    }

    fn first_parms_id(&self) -> ParmsId {
        if self.parameters_set() {
            HeContext::first_parms_id(self)
        } else {
            self.params.parms_id()
        }
    }
}
