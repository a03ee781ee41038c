use evindex::decoders::erc20::{TransferDecoder, TRANSFER_EVENT_SIGNATURE};
use evindex::{ChainId, Contract};

pub const USDC_CONTRACT_ADDRESS: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const USDC_CONTRACT_START_BLOCK_NUMBER: u64 = 18_115_938;

pub const DAI_CONTRACT_ADDRESS: &str = "0x6B175474E89094C44Da98b954EedeAC495271d0F";

pub fn usdc_contract() -> Contract {
    Contract::new("UsdCoin")
        .add_event(TRANSFER_EVENT_SIGNATURE, TransferDecoder)
        .add_address(
            USDC_CONTRACT_ADDRESS,
            &ChainId::Mainnet,
            USDC_CONTRACT_START_BLOCK_NUMBER,
        )
}

/// Same deployment with no registered decoder, so its logs get
/// ingested raw
pub fn undecoded_usdc_contract() -> Contract {
    Contract::new("UsdCoin").add_address(
        USDC_CONTRACT_ADDRESS,
        &ChainId::Mainnet,
        USDC_CONTRACT_START_BLOCK_NUMBER,
    )
}
