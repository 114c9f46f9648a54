//! Site-level INFO fields computed by the pipeline and their VCF header definitions
//!

use std::collections::BTreeMap;

use strum::{EnumIter, IntoStaticStr};

#[derive(Clone, Copy, Debug, IntoStaticStr, PartialEq, Eq)]
pub enum VcfInfoType {
    Integer,
    Float,
}

pub struct InfoFieldDefinition {
    /// VCF 'Number' header value
    pub number: &'static str,
    pub vcf_type: VcfInfoType,
    pub description: &'static str,
}

/// All INFO fields which may be written to the sites-only VCF
///
/// Enum order is the INFO field output order.
///
#[derive(Clone, Copy, Debug, EnumIter, IntoStaticStr, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InfoField {
    #[strum(serialize = "AC")]
    Ac,
    #[strum(serialize = "AC_raw")]
    AcRaw,
    #[strum(serialize = "ANS")]
    Ans,
    #[strum(serialize = "AS_FS")]
    AsFs,
    #[strum(serialize = "AS_MQ")]
    AsMq,
    #[strum(serialize = "AS_MQRankSum")]
    AsMqRankSum,
    #[strum(serialize = "AS_MQ_DP")]
    AsMqDp,
    #[strum(serialize = "AS_QUALapprox")]
    AsQualApprox,
    #[strum(serialize = "AS_RAW_MQ")]
    AsRawMq,
    #[strum(serialize = "AS_ReadPosRankSum")]
    AsReadPosRankSum,
    #[strum(serialize = "AS_SB_TABLE")]
    AsSbTable,
    #[strum(serialize = "AS_SOR")]
    AsSor,
    #[strum(serialize = "AS_VarDP")]
    AsVarDp,
    #[strum(serialize = "DP")]
    Dp,
    #[strum(serialize = "FS")]
    Fs,
    #[strum(serialize = "MQ")]
    Mq,
    #[strum(serialize = "MQRankSum")]
    MqRankSum,
    #[strum(serialize = "MQ_DP")]
    MqDp,
    #[strum(serialize = "QD")]
    Qd,
    #[strum(serialize = "QUALapprox")]
    QualApprox,
    #[strum(serialize = "RAW_MQ")]
    RawMq,
    #[strum(serialize = "ReadPosRankSum")]
    ReadPosRankSum,
    #[strum(serialize = "SB")]
    Sb,
    #[strum(serialize = "SOR")]
    Sor,
    #[strum(serialize = "VarDP")]
    VarDp,
}

impl InfoField {
    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn definition(self) -> InfoFieldDefinition {
        use InfoField::*;
        use VcfInfoType::*;
        let (number, vcf_type, description) = match self {
            Ac => (
                "A",
                Integer,
                "Alternate allele count for samples, restricted to genotypes passing adj quality thresholds",
            ),
            AcRaw => (
                "A",
                Integer,
                "Alternate allele count for samples, before removing low-confidence genotypes",
            ),
            Ans => (
                "1",
                Integer,
                "Allele number surrogate, twice the number of samples with a defined genotype call",
            ),
            AsFs => (
                "A",
                Float,
                "Allele-specific phred-scaled p-value of Fisher's exact test for strand bias",
            ),
            AsMq => (
                "A",
                Float,
                "Allele-specific root mean square of the mapping quality of reads across all samples",
            ),
            AsMqRankSum => (
                "A",
                Float,
                "Allele-specific z-score from Wilcoxon rank sum test of alternate vs. reference read mapping qualities",
            ),
            AsMqDp => (
                "A",
                Integer,
                "Allele-specific depth over variant samples for better MQ calculation",
            ),
            AsQualApprox => (
                "A",
                Integer,
                "Allele-specific sum of PL[0] values, used to approximate the QUAL score",
            ),
            AsRawMq => (
                "A",
                Float,
                "Allele-specific raw root mean square of the mapping quality of reads across all samples",
            ),
            AsReadPosRankSum => (
                "A",
                Float,
                "Allele-specific z-score from Wilcoxon rank sum test of alternate vs. reference read position bias",
            ),
            AsSbTable => (
                ".",
                Integer,
                "Allele-specific forward and reverse read counts for strand bias tests, the reference allele \
                 pair is followed by one pair for each alternate allele",
            ),
            AsSor => (
                "A",
                Float,
                "Allele-specific strand bias estimated by the symmetric odds ratio test",
            ),
            AsVarDp => (
                "A",
                Integer,
                "Allele-specific depth over variant genotypes (does not include depth of reference samples)",
            ),
            Dp => (
                "1",
                Integer,
                "Depth of informative coverage for each sample, summed across all samples",
            ),
            Fs => (
                "1",
                Float,
                "Phred-scaled p-value of Fisher's exact test for strand bias",
            ),
            Mq => (
                "1",
                Float,
                "Root mean square of the mapping quality of reads across all samples",
            ),
            MqRankSum => (
                "1",
                Float,
                "Z-score from Wilcoxon rank sum test of alternate vs. reference read mapping qualities",
            ),
            MqDp => (
                "1",
                Integer,
                "Depth over variant samples for better MQ calculation",
            ),
            Qd => (
                "1",
                Float,
                "Variant call confidence normalized by depth of sample reads supporting a variant",
            ),
            QualApprox => (
                "1",
                Integer,
                "Sum of PL[0] values, used to approximate the QUAL score",
            ),
            RawMq => (
                "1",
                Float,
                "Raw root mean square of the mapping quality of reads across all samples",
            ),
            ReadPosRankSum => (
                "1",
                Float,
                "Z-score from Wilcoxon rank sum test of alternate vs. reference read position bias",
            ),
            Sb => (
                "4",
                Integer,
                "Per-sample component statistics which comprise the Fisher's exact test to detect strand bias, \
                 values are: depth of reference allele on forward strand, depth of reference allele on reverse strand, \
                 depth of alternate allele on forward strand, depth of alternate allele on reverse strand",
            ),
            Sor => (
                "1",
                Float,
                "Strand bias estimated by the symmetric odds ratio test",
            ),
            VarDp => (
                "1",
                Integer,
                "Depth over variant genotypes (does not include depth of reference samples)",
            ),
        };
        InfoFieldDefinition {
            number,
            vcf_type,
            description,
        }
    }

    pub fn get_vcf_header_line(self) -> String {
        let definition = self.definition();
        let vcf_type: &'static str = definition.vcf_type.into();
        format!(
            "##INFO=<ID={},Number={},Type={},Description=\"{}\">",
            self.id(),
            definition.number,
            vcf_type,
            definition.description
        )
    }
}

/// INFO values before conversion to VCF-compatible types
#[derive(Clone, Debug, PartialEq)]
pub enum InfoValue {
    Int(i64),
    Float(f64),
    IntArray(Vec<i64>),

    /// Array with missing elements, such as per-allele values with no supporting genotype
    NullableIntArray(Vec<Option<i64>>),
    NullableFloatArray(Vec<Option<f64>>),
}

pub type InfoMap = BTreeMap<InfoField, InfoValue>;

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    #[test]
    fn test_info_field_ids() {
        assert_eq!(InfoField::AcRaw.id(), "AC_raw");
        assert_eq!(InfoField::MqDp.id(), "MQ_DP");
        assert_eq!(InfoField::QualApprox.id(), "QUALapprox");
    }

    #[test]
    fn test_info_field_order() {
        let fields = InfoField::iter().collect::<Vec<_>>();
        let mut sorted_fields = fields.clone();
        sorted_fields.sort();
        assert_eq!(fields, sorted_fields);
        assert_eq!(fields.first(), Some(&InfoField::Ac));
    }

    #[test]
    fn test_get_vcf_header_line() {
        assert_eq!(
            InfoField::Ans.get_vcf_header_line(),
            "##INFO=<ID=ANS,Number=1,Type=Integer,Description=\"Allele number surrogate, twice the number of samples with a defined genotype call\">"
        );
        assert!(
            InfoField::Sb
                .get_vcf_header_line()
                .starts_with("##INFO=<ID=SB,Number=4,Type=Integer,")
        );
        assert!(
            InfoField::AsSor
                .get_vcf_header_line()
                .starts_with("##INFO=<ID=AS_SOR,Number=A,Type=Float,")
        );
        assert!(
            InfoField::AsSbTable
                .get_vcf_header_line()
                .starts_with("##INFO=<ID=AS_SB_TABLE,Number=.,Type=Integer,")
        );
    }
}
