//! Neighbouring detector elements
//!
//! The extrapolated crossing point carries an uncertainty, and modules overlap,
//! so the hit search covers the struck element and the elements around it:
//! one module step in azimuth (stave/petal) and one sensor step along the
//! module, a 3×3 block including the element itself.

use smallvec::{smallvec, SmallVec};

use crate::common::{CellIdCodec, DetectorElementId, ElementFields};

/// The struck element followed by up to eight neighbours
pub type Neighbourhood = SmallVec<[DetectorElementId; 9]>;

const STEPS: [i64; 3] = [-1, 0, 1];

/// Enumerate the element and its neighbours.
///
/// The element itself is always first. Module indices wrap around when the
/// layer's module count is known (more than one module); otherwise
/// neighbours beyond the first or last module are dropped. Neighbours with a
/// sensor index `<= 0`, or any index the codec cannot represent, are dropped
/// as well. There is no check against the number of sensors on a module.
///
/// Neighbours are encoded from subdetector, layer, module and sensor only;
/// their side field is always 0.
pub fn neighbours(
    element: DetectorElementId,
    codec: &CellIdCodec,
    modules_per_layer: &[usize],
) -> Neighbourhood {
    let mut ids: Neighbourhood = smallvec![element];

    let fields = match codec.element_fields(element) {
        Ok(fields) => fields,
        Err(e) => {
            log::debug!("Cannot decode element {}: {}", element, e);
            return ids;
        }
    };

    let last_module = usize::try_from(fields.layer)
        .ok()
        .and_then(|layer| modules_per_layer.get(layer))
        .map_or(-1, |&n| n as i64 - 1);

    log::trace!(
        "Neighbours of element {} (subdet {}, side {}, layer {}, module {}, sensor {}), last module {}",
        element,
        fields.subdet,
        fields.side,
        fields.layer,
        fields.module,
        fields.sensor,
        last_module
    );

    for module_step in STEPS {
        for sensor_step in STEPS {
            if module_step == 0 && sensor_step == 0 {
                continue;
            }

            let mut module = fields.module + module_step;
            if last_module > 0 {
                if module == last_module + 1 {
                    module = 0;
                } else if module == -1 {
                    module = last_module;
                }
            }

            let sensor = fields.sensor + sensor_step;
            if sensor <= 0 {
                continue;
            }

            let candidate = ElementFields {
                side: 0,
                module,
                sensor,
                ..fields
            };
            match codec.element_id(&candidate) {
                Ok(id) => ids.push(id),
                Err(e) => log::trace!("Skipping neighbour of {}: {}", element, e),
            }
        }
    }

    ids
}
